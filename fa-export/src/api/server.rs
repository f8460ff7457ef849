//! API server setup and configuration.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, info};

use crate::api::error::ApiError;
use crate::api::routes;
use crate::cache::{Cache, CacheBackend, MemoryBackend, RedisBackend};
use crate::config::AppConfig;
use crate::credentials::{BackendCredentialStore, CredentialResolver};
use crate::upstream::{HttpUpstream, Upstream};
use crate::{Error, Result};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ApiServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
        }
    }
}

/// Shared application state.
///
/// Everything here is either immutable or internally synchronised; no field
/// holds per-request session data.
#[derive(Clone)]
pub struct AppState {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    pub config: Arc<AppConfig>,
    pub cache: Cache,
    pub resolver: Arc<CredentialResolver>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    /// Wire the state from its collaborators. The system cookie is persisted
    /// in the same backend as the document cache.
    pub fn new(
        config: Arc<AppConfig>,
        backend: Arc<dyn CacheBackend>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        let cache = Cache::new(backend.clone(), &config.cache);
        let store = Arc::new(BackendCredentialStore::new(backend));
        let resolver = Arc::new(CredentialResolver::new(
            config.system_login.clone(),
            store,
            upstream.clone(),
        ));

        Self {
            start_time: Instant::now(),
            config,
            cache,
            resolver,
            upstream,
        }
    }

    /// Build the production state: Redis when configured, otherwise the
    /// in-memory store, and the HTTP upstream.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let backend: Arc<dyn CacheBackend> = match config.cache.redis_url.as_deref() {
            Some(url) => Arc::new(
                RedisBackend::connect(url)
                    .await
                    .map_err(|e| Error::config(format!("Failed to connect to Redis: {e}")))?,
            ),
            None => {
                info!(
                    max_entries = config.cache.max_entries,
                    "No Redis URL configured, using in-memory cache"
                );
                Arc::new(MemoryBackend::new(config.cache.max_entries))
            }
        };

        let upstream = Arc::new(HttpUpstream::from_settings(config.upstream.clone())?);
        Ok(Self::new(Arc::new(config), backend, upstream))
    }
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::internal().into_response()
}

fn is_health_path(path: &str) -> bool {
    path == "/health" || path.starts_with("/health/")
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn with_state(config: ApiServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build the router with all middleware and routes.
    pub fn router(&self) -> Router {
        let mut router = routes::create_router(self.state.clone());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin);
            router = router.layer(cors);
        }

        router = router.layer(CatchPanicLayer::custom(handle_panic));

        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    if is_health_path(req.uri().path()) {
                        Span::none()
                    } else {
                        let mut make_span =
                            tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO);
                        use tower_http::trace::MakeSpan;
                        make_span.make_span(req)
                    }
                })
                .on_request(|req: &Request, span: &Span| {
                    if span.is_disabled() || is_health_path(req.uri().path()) {
                        return;
                    }
                    let mut on_request =
                        tower_http::trace::DefaultOnRequest::new().level(tracing::Level::INFO);
                    use tower_http::trace::OnRequest;
                    on_request.on_request(req, span);
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        let on_response =
                            tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO);
                        use tower_http::trace::OnResponse;
                        on_response.on_response(res, latency, span);
                    },
                )
                .on_failure(
                    |class: tower_http::classify::ServerErrorsFailureClass,
                     latency: Duration,
                     span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        let mut on_failure =
                            tower_http::trace::DefaultOnFailure::new().level(tracing::Level::ERROR);
                        use tower_http::trace::OnFailure;
                        on_failure.on_failure(class, latency, span);
                    },
                ),
        )
    }

    /// Start the server.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid address: {}", e)))?;

        let router = self.router();
        let listener = TcpListener::bind(addr).await?;

        info!("API server listening on http://{}", addr);

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("API server shutting down...");
            })
            .await
            .map_err(|e| Error::Other(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
