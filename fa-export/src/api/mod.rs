//! HTTP API.

pub mod error;
pub mod request;
pub mod routes;
pub mod server;

pub use error::{ApiError, classify};
pub use server::{ApiServer, ApiServerConfig, AppState};
