use fa_export::api::{ApiServer, ApiServerConfig, AppState};
use fa_export::config::AppConfig;
use fa_export::{logging, panic_hook};
use mimalloc::MiMalloc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    let logging = logging::init_logging(&config.log_dir)?;
    panic_hook::install(logging.log_dir());

    let shutdown = CancellationToken::new();
    logging.start_retention_cleanup(shutdown.child_token());

    let state = AppState::from_config(config).await?;

    // Establish the system session up front; requests retry if this fails.
    if let Err(e) = state.resolver.system_cookie().await {
        warn!(
            error = %e,
            "System session unavailable, requests without FA_COOKIE will fail until it is established"
        );
    }

    let server = ApiServer::with_state(ApiServerConfig::from(state.config.as_ref()), state);
    let server_token = server.cancel_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received");
        server_token.cancel();
        shutdown.cancel();
    });

    server.run().await?;

    info!("fa-export stopped");
    Ok(())
}
