#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use fa_export::api::{ApiServer, ApiServerConfig, AppState};
use fa_export::cache::{CacheBackend, MemoryBackend};
use fa_export::config::{AppConfig, SystemLogin};
use fa_export::credentials::LoginCookie;
use fa_export::error::FaError;
use fa_export::session::SessionContext;
use fa_export::upstream::Upstream;
use fa_export::{Error, Result};
use fa_scraper::{
    CurrentUser, GalleryFolder, Notifications, SearchQuery, Submission, Watch,
};
use tower::ServiceExt;

pub const COOKIE_A: &str =
    "b=11111111-1111-1111-1111-111111111111; a=22222222-2222-2222-2222-222222222222";
pub const COOKIE_B: &str =
    "b=33333333-3333-3333-3333-333333333333; a=44444444-4444-4444-4444-444444444444";
pub const SYSTEM_COOKIE: &str =
    "b=aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa; a=bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb";

/// Canned failure the stub returns instead of data.
#[derive(Clone)]
pub enum Failure {
    Classified(FaError),
    Transport(String),
}

/// Upstream double that echoes the session it was called with.
///
/// Every submission title is the credential the call ran with and the rating
/// reflects the safe-for-work flag, so a response shows exactly which session
/// produced it.
#[derive(Default)]
pub struct EchoUpstream {
    pub calls: AtomicUsize,
    pub logins: AtomicUsize,
    pub submissions_per_page: usize,
    failure: Mutex<Option<Failure>>,
}

impl EchoUpstream {
    pub fn new() -> Self {
        Self {
            submissions_per_page: 1,
            ..Default::default()
        }
    }

    pub fn with_submissions(count: usize) -> Self {
        Self {
            submissions_per_page: count,
            ..Default::default()
        }
    }

    pub fn fail_with(&self, failure: Failure) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Give other requests a chance to interleave with this one.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        match self.failure.lock().unwrap().clone() {
            Some(Failure::Classified(err)) => Err(err.into()),
            Some(Failure::Transport(msg)) => Err(Error::Upstream(msg)),
            None => Ok(()),
        }
    }

    fn echo(&self, session: &SessionContext, link_prefix: &str) -> Vec<Submission> {
        (1..=self.submissions_per_page)
            .map(|i| Submission {
                id: i.to_string(),
                title: session.credential().as_str().to_string(),
                link: format!("https://www.furaffinity.net/view/{link_prefix}{i}/"),
                thumbnail: None,
                rating: if session.safe_for_work() {
                    "general".to_string()
                } else {
                    "adult".to_string()
                },
            })
            .collect()
    }
}

#[async_trait]
impl Upstream for EchoUpstream {
    async fn login(&self, _username: &str, _password: &str) -> Result<LoginCookie> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(LoginCookie::parse(SYSTEM_COOKIE)?)
    }

    async fn notifications(
        &self,
        session: &SessionContext,
        include_deleted: bool,
    ) -> Result<Notifications> {
        self.enter().await?;
        let mut new_watches = vec![Watch {
            watch_id: "1".to_string(),
            profile_name: "watcher".to_string(),
            deleted: false,
        }];
        if include_deleted {
            new_watches.push(Watch {
                watch_id: "2".to_string(),
                profile_name: String::new(),
                deleted: true,
            });
        }
        Ok(Notifications {
            current_user: CurrentUser {
                name: session.credential().as_str().to_string(),
                profile_name: "me".to_string(),
            },
            new_watches,
        })
    }

    async fn gallery(
        &self,
        session: &SessionContext,
        user: &str,
        _folder: GalleryFolder,
        _page: u32,
    ) -> Result<Vec<Submission>> {
        self.enter().await?;
        Ok(self.echo(session, user))
    }

    async fn search(
        &self,
        session: &SessionContext,
        _query: &SearchQuery,
    ) -> Result<Vec<Submission>> {
        self.enter().await?;
        Ok(self.echo(session, "s"))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        system_login: SystemLogin {
            username: None,
            password: None,
            cookie: Some(SYSTEM_COOKIE.to_string()),
        },
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upstream: Arc<EchoUpstream>,
    pub backend: Arc<dyn CacheBackend>,
}

impl TestApp {
    pub fn new(upstream: EchoUpstream) -> Self {
        Self::with_backend(upstream, Arc::new(MemoryBackend::new(1_000)), test_config())
    }

    pub fn with_backend(
        upstream: EchoUpstream,
        backend: Arc<dyn CacheBackend>,
        config: AppConfig,
    ) -> Self {
        let upstream = Arc::new(upstream);
        let state = AppState::new(Arc::new(config), backend.clone(), upstream.clone());
        let router =
            ApiServer::with_state(ApiServerConfig::default(), state.clone()).router();
        Self {
            router,
            state,
            upstream,
            backend,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("FA_COOKIE", cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

pub fn content_type(response: &Response<Body>) -> &str {
    response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
