//! Boundary to FurAffinity.
//!
//! Route handlers depend on the [`Upstream`] trait rather than on the scraper
//! directly. Every call receives the request's [`SessionContext`]; nothing
//! about the session is held between calls.

use async_trait::async_trait;
use fa_scraper::{Furaffinity, GalleryFolder, Notifications, SearchQuery, Submission};
use reqwest::Client;
use tracing::debug;

use crate::Result;
use crate::config::UpstreamSettings;
use crate::credentials::LoginCookie;
use crate::error::FaError;
use crate::session::SessionContext;

#[async_trait]
pub trait Upstream: Send + Sync {
    /// Log in with a username and password and return the session cookie.
    async fn login(&self, username: &str, password: &str) -> Result<LoginCookie>;

    async fn notifications(
        &self,
        session: &SessionContext,
        include_deleted: bool,
    ) -> Result<Notifications>;

    async fn gallery(
        &self,
        session: &SessionContext,
        user: &str,
        folder: GalleryFolder,
        page: u32,
    ) -> Result<Vec<Submission>>;

    async fn search(&self, session: &SessionContext, query: &SearchQuery)
    -> Result<Vec<Submission>>;
}

/// [`Upstream`] over HTTP.
///
/// Holds only the pooled transport and static settings. A fresh
/// [`Furaffinity`] handle is built for every call from the context passed in.
pub struct HttpUpstream {
    client: Client,
    settings: UpstreamSettings,
}

impl HttpUpstream {
    pub fn new(client: Client, settings: UpstreamSettings) -> Self {
        Self { client, settings }
    }

    /// Build the transport from settings.
    pub fn from_settings(settings: UpstreamSettings) -> Result<Self> {
        let client = fa_scraper::default_client(settings.request_timeout)
            .map_err(|e| crate::Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client, settings))
    }

    fn handle(&self, session: &SessionContext) -> Furaffinity {
        let safe_for_work = session.safe_for_work();
        Furaffinity::new(
            self.client.clone(),
            self.settings.base_for(safe_for_work).clone(),
        )
        .with_cookie(session.credential().as_str())
        .with_safe_for_work(safe_for_work)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn login(&self, username: &str, password: &str) -> Result<LoginCookie> {
        let fa = Furaffinity::new(self.client.clone(), self.settings.base_url.clone());
        let raw = fa.login(username, password).await?;
        LoginCookie::parse(&raw).map_err(|_| {
            FaError::login(format!(
                "FA returned an unrecognised session cookie while logging in as {username}"
            ))
            .into()
        })
    }

    async fn notifications(
        &self,
        session: &SessionContext,
        include_deleted: bool,
    ) -> Result<Notifications> {
        debug!(include_deleted, "Fetching notifications");
        Ok(self.handle(session).notifications(include_deleted).await?)
    }

    async fn gallery(
        &self,
        session: &SessionContext,
        user: &str,
        folder: GalleryFolder,
        page: u32,
    ) -> Result<Vec<Submission>> {
        debug!(user, folder = folder.as_str(), page, "Fetching gallery");
        Ok(self.handle(session).gallery(user, folder, page).await?)
    }

    async fn search(
        &self,
        session: &SessionContext,
        query: &SearchQuery,
    ) -> Result<Vec<Submission>> {
        debug!(q = %query.q, page = query.page, "Searching");
        Ok(self.handle(session).search(query).await?)
    }
}
