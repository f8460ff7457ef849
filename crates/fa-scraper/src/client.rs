use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::debug;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build the transport shared by every [`crate::Furaffinity`] handle.
///
/// The client holds no cookie store, so credentials only ever travel on the
/// per-handle `Cookie` header. Redirects are not followed: FA answers a
/// logged-out request with a redirect to the login page, which the handle
/// reports as a login failure.
pub fn create_client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    install_rustls_provider();

    let mut builder = Client::builder()
        .user_agent(DEFAULT_UA)
        .redirect(Policy::none());

    if timeout > Duration::ZERO {
        builder = builder.timeout(timeout);
    }

    builder
}

pub fn default_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    create_client_builder(timeout).build()
}
