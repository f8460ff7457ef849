//! Process configuration.
//!
//! Every option is read from the environment (a `.env` file is loaded by the
//! binary first). [`AppConfig::from_lookup`] takes the variable source as a
//! closure so configuration can be built without touching the process
//! environment.

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Default short TTL (30 seconds).
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(30);
/// Default long TTL for feeds (1 day).
pub const DEFAULT_CACHE_TIME_LONG: Duration = Duration::from_secs(86_400);
/// Default number of items in an RSS feed.
pub const DEFAULT_RSS_LIMIT: usize = 10;
/// Default capacity of the in-memory cache backend.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;
pub const DEFAULT_LOG_DIR: &str = "logs/";

/// Settings for the cache layer.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// TTL for JSON/XML documents.
    pub short_ttl: Duration,
    /// TTL for RSS feeds.
    pub long_ttl: Duration,
    /// Redis connection URL. `None` selects the in-memory backend.
    pub redis_url: Option<String>,
    /// Capacity of the in-memory backend.
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            short_ttl: DEFAULT_CACHE_TIME,
            long_ttl: DEFAULT_CACHE_TIME_LONG,
            redis_url: None,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

/// How the process obtains its own FA session.
#[derive(Debug, Clone, Default)]
pub struct SystemLogin {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Cookie that overrides both the persisted cookie and a fresh login.
    pub cookie: Option<String>,
}

/// Where upstream requests are sent.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: Url,
    /// Alternative base for every request (e.g. a challenge-solving proxy).
    pub bypass_url: Option<Url>,
    /// Alternative base for safe-for-work requests.
    pub bypass_sfw_url: Option<Url>,
    pub request_timeout: Duration,
}

impl UpstreamSettings {
    /// Base URL for a request in the given scope.
    pub fn base_for(&self, safe_for_work: bool) -> &Url {
        if safe_for_work
            && let Some(url) = self.bypass_sfw_url.as_ref()
        {
            return url;
        }
        self.bypass_url.as_ref().unwrap_or(&self.base_url)
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(fa_scraper::Furaffinity::BASE_URL)
                .expect("default FA base URL is valid"),
            bypass_url: None,
            bypass_sfw_url: None,
            request_timeout: fa_scraper::DEFAULT_TIMEOUT,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub port: u16,
    pub enable_cors: bool,
    pub cache: CacheSettings,
    pub system_login: SystemLogin,
    pub upstream: UpstreamSettings,
    pub rss_limit: usize,
    pub log_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 9292,
            enable_cors: true,
            cache: CacheSettings::default(),
            system_login: SystemLogin::default(),
            upstream: UpstreamSettings::default(),
            rss_limit: DEFAULT_RSS_LIMIT,
            log_dir: DEFAULT_LOG_DIR.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset. Numeric options that fail to parse
    /// are configuration errors rather than silently defaulted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(bind_address) = get("API_BIND_ADDRESS") {
            config.bind_address = bind_address;
        }
        if let Some(port) = get("API_PORT").or_else(|| get("PORT")) {
            config.port = parse_number("API_PORT", &port)?;
        }
        if let Some(cors) = get("API_ENABLE_CORS") {
            config.enable_cors = !matches!(cors.trim(), "0" | "false" | "no");
        }

        if let Some(secs) = get("CACHE_TIME") {
            config.cache.short_ttl = Duration::from_secs(parse_number("CACHE_TIME", &secs)?);
        }
        if let Some(secs) = get("CACHE_TIME_LONG") {
            config.cache.long_ttl = Duration::from_secs(parse_number("CACHE_TIME_LONG", &secs)?);
        }
        config.cache.redis_url = get("REDIS_URL").or_else(|| get("REDISTOGO_URL"));
        if let Some(max) = get("CACHE_MAX_ENTRIES") {
            config.cache.max_entries = parse_number("CACHE_MAX_ENTRIES", &max)?;
        }

        config.system_login = SystemLogin {
            username: get("FA_USERNAME"),
            password: get("FA_PASSWORD"),
            cookie: get("FA_COOKIE").map(|c| unescape_shell(&c)),
        };

        if let Some(base) = get("FA_BASE_URL") {
            config.upstream.base_url = parse_url("FA_BASE_URL", &base)?;
        }
        if let Some(bypass) = get("CF_BYPASS") {
            config.upstream.bypass_url = Some(parse_url("CF_BYPASS", &bypass)?);
        }
        if let Some(bypass) = get("CF_BYPASS_SFW") {
            config.upstream.bypass_sfw_url = Some(parse_url("CF_BYPASS_SFW", &bypass)?);
        }
        if let Some(secs) = get("FA_REQUEST_TIMEOUT_SECS") {
            config.upstream.request_timeout =
                Duration::from_secs(parse_number("FA_REQUEST_TIMEOUT_SECS", &secs)?);
        }

        if let Some(limit) = get("RSS_LIMIT") {
            config.rss_limit = parse_number("RSS_LIMIT", &limit)?;
        }
        if let Some(log_dir) = get("LOG_DIR") {
            config.log_dir = log_dir;
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| Error::config(format!("{key} must be a number, got '{value}'")))
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value.trim()).map_err(|e| Error::config(format!("{key} is not a valid URL: {e}")))
}

/// Container runtimes often pass the cookie shell-escaped (`a\=...\;b\=...`).
fn unescape_shell(value: &str) -> String {
    value.replace("\\=", "=").replace("\\;", ";").trim().to_string()
}
