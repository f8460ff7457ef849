//! Credential handling: cookie validation, the system session and its
//! persistence.

pub mod cookie;
pub mod resolver;
pub mod store;

pub use cookie::LoginCookie;
pub use resolver::CredentialResolver;
pub use store::{BackendCredentialStore, CredentialStore, LOGIN_COOKIE_KEY};
