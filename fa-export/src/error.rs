//! Application-wide error types.

use std::fmt;

use fa_scraper::ScraperError;
use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of failures the gateway reports to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed search parameters.
    Search,
    /// The `FA_COOKIE` header does not look like an FA login cookie.
    LoginCookie,
    /// FA rejected a submitted form.
    Form,
    /// Malformed page/offset parameter.
    Offset,
    /// The session was not logged in.
    Login,
    /// FA answered with a system message page (missing user, deleted submission).
    System,
    /// FA answered with an unexpected HTTP status.
    Status,
    /// An anti-bot challenge was served instead of the page.
    Cloudflare,
    /// The cache store failed.
    Cache,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "SearchError",
            Self::LoginCookie => "LoginCookieError",
            Self::Form => "FormError",
            Self::Offset => "OffsetError",
            Self::Login => "LoginError",
            Self::System => "SystemError",
            Self::Status => "StatusError",
            Self::Cloudflare => "CloudflareError",
            Self::Cache => "CacheError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure: what went wrong, a caller-facing message, and the
/// FA page involved when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FaError {
    pub kind: ErrorKind,
    pub message: String,
    pub url: Option<String>,
}

impl FaError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn search(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Search, message)
    }

    pub fn login_cookie(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LoginCookie, message)
    }

    pub fn offset(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Offset, message)
    }

    pub fn login(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Login, message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }
}

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fa(#[from] FaError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Upstream transport error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error while {op} at {path}: {source}")]
    IoPath {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn io_path(op: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::IoPath {
            op,
            path: path.display().to_string(),
            source,
        }
    }

    /// The classified failure, if this error is one.
    pub fn as_fa(&self) -> Option<&FaError> {
        match self {
            Self::Fa(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ScraperError> for Error {
    fn from(err: ScraperError) -> Self {
        let url = err.url().map(str::to_owned);
        let kind = match &err {
            ScraperError::Login { .. } => ErrorKind::Login,
            ScraperError::Status { .. } => ErrorKind::Status,
            ScraperError::Cloudflare { .. } => ErrorKind::Cloudflare,
            ScraperError::System { .. } => ErrorKind::System,
            ScraperError::Form { .. } => ErrorKind::Form,
            ScraperError::InvalidUrl(_) | ScraperError::HttpError(_) => {
                return Error::Upstream(err.to_string());
            }
        };
        Error::Fa(FaError {
            kind,
            message: err.to_string(),
            url,
        })
    }
}
