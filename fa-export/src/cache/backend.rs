//! Storage abstraction for cached documents.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a cache store.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The store refused the write for lack of space.
    #[error("{0}")]
    OutOfMemory(String),
    /// The store could not be reached or answered with an error.
    #[error("{0}")]
    Unavailable(String),
}

/// A string key-value store with optional per-entry expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short name for logs and health output.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Store a value. `ttl = None` stores it without expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>)
    -> Result<(), BackendError>;

    async fn delete(&self, key: &str) -> Result<(), BackendError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), BackendError>;
}
