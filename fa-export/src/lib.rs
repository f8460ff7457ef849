//! fa-export library crate.
//!
//! A read-only HTTP gateway over FurAffinity: page data is fetched with a
//! per-request session, rendered to JSON, XML or RSS and cached by resource,
//! scope and format.

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod format;
pub mod logging;
pub mod panic_hook;
pub mod session;
pub mod upstream;
pub mod utils;

pub use error::{Error, Result};
