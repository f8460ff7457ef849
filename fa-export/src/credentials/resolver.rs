//! Decides which FA session a request runs with.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::Result;
use crate::config::SystemLogin;
use crate::credentials::{CredentialStore, LoginCookie};
use crate::error::FaError;
use crate::session::ResolvedCredential;
use crate::upstream::Upstream;

/// Resolves the credential for each request.
///
/// A caller-supplied cookie always wins and is only validated, never
/// persisted. Without one, the process-wide system cookie is used. It is
/// initialised at most once per process: concurrent first requests wait on
/// the same initialisation, and a failed initialisation is retried by the
/// next request.
pub struct CredentialResolver {
    system: OnceCell<LoginCookie>,
    login: SystemLogin,
    store: Arc<dyn CredentialStore>,
    upstream: Arc<dyn Upstream>,
}

impl CredentialResolver {
    pub fn new(
        login: SystemLogin,
        store: Arc<dyn CredentialStore>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            system: OnceCell::new(),
            login,
            store,
            upstream,
        }
    }

    /// Resolve the credential for a request given its raw `FA_COOKIE` header.
    pub async fn resolve(&self, header: Option<&str>) -> Result<ResolvedCredential> {
        match header {
            Some(raw) => Ok(ResolvedCredential::caller(LoginCookie::parse(raw)?)),
            None => Ok(ResolvedCredential::system(self.system_cookie().await?.clone())),
        }
    }

    /// The process's own session, initialising it on first use.
    pub async fn system_cookie(&self) -> Result<&LoginCookie> {
        self.system
            .get_or_try_init(|| self.initialize_system_cookie())
            .await
    }

    async fn initialize_system_cookie(&self) -> Result<LoginCookie> {
        if let Some(cookie) = self.login.cookie.as_deref() {
            info!("Using configured system cookie");
            return parse_system(cookie);
        }

        if let Some(stored) = self.store.load().await? {
            match LoginCookie::parse(&stored) {
                Ok(cookie) => {
                    info!("Using persisted system cookie");
                    return Ok(cookie);
                }
                Err(_) => warn!("Persisted system cookie is malformed, logging in again"),
            }
        }

        let (Some(username), Some(password)) = (
            self.login.username.as_deref(),
            self.login.password.as_deref(),
        ) else {
            return Err(FaError::login(
                "No system login is configured; set FA_COOKIE or FA_USERNAME and FA_PASSWORD",
            )
            .into());
        };

        info!(username, "Logging in to FA for the system session");
        let cookie = self.upstream.login(username, password).await?;
        self.store.save(cookie.as_str()).await?;
        Ok(cookie)
    }
}

fn parse_system(raw: &str) -> Result<LoginCookie> {
    LoginCookie::parse(raw)
        .map_err(|e| FaError::login(format!("The configured system cookie is invalid: {e}")).into())
}
