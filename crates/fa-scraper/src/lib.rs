//! Page fetching and extraction for FurAffinity.
//!
//! [`Furaffinity`] is a per-caller handle built from a shared
//! [`reqwest::Client`]. It carries the caller's login cookie and
//! safe-for-work preference for its own lifetime only, so independent
//! callers never observe each other's session.

mod client;
pub mod error;
mod furaffinity;
pub mod models;
pub mod utils;

pub use client::{DEFAULT_TIMEOUT, create_client_builder, default_client, install_rustls_provider};
pub use error::ScraperError;
pub use furaffinity::Furaffinity;
pub use models::{
    CurrentUser, GalleryFolder, Notifications, OrderBy, SEARCH_PAGE_SIZES, SearchQuery,
    Submission, Watch,
};
