//! Persistence for the system login cookie.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::cache::CacheBackend;
use crate::cache::backend::BackendError;
use crate::error::FaError;

/// Key the system cookie is stored under.
pub const LOGIN_COOKIE_KEY: &str = "login_cookie";

/// Somewhere the system cookie survives process restarts.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>>;
    async fn save(&self, cookie: &str) -> Result<()>;
}

/// Stores the cookie in the cache backend without an expiry.
pub struct BackendCredentialStore {
    backend: Arc<dyn CacheBackend>,
}

impl BackendCredentialStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }
}

fn store_error(err: BackendError) -> crate::Error {
    FaError::cache(format!("Error accessing Redis Cache: {err}")).into()
}

#[async_trait]
impl CredentialStore for BackendCredentialStore {
    async fn load(&self) -> Result<Option<String>> {
        self.backend.get(LOGIN_COOKIE_KEY).await.map_err(store_error)
    }

    async fn save(&self, cookie: &str) -> Result<()> {
        self.backend
            .set(LOGIN_COOKIE_KEY, cookie, None)
            .await
            .map_err(store_error)
    }
}
