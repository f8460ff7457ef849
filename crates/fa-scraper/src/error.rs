use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Unable to log into FA to access {url}.")]
    Login { url: String },
    #[error("FA returned a status of '{status}' while trying to access {url}.")]
    Status { url: String, status: u16 },
    #[error("Cannot access FA at {url} as cloudflare protection is up.")]
    Cloudflare { url: String },
    #[error("{message}")]
    System { url: String, message: String },
    #[error("{message}")]
    Form { url: String, message: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl ScraperError {
    /// The page the error was raised for, when one is known.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Login { url }
            | Self::Status { url, .. }
            | Self::Cloudflare { url }
            | Self::System { url, .. }
            | Self::Form { url, .. } => Some(url),
            Self::InvalidUrl(_) | Self::HttpError(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = ScraperError::Status {
            url: "https://www.furaffinity.net/gallery/foo/1/".to_string(),
            status: 500,
        };
        assert_eq!(
            err.to_string(),
            "FA returned a status of '500' while trying to access https://www.furaffinity.net/gallery/foo/1/."
        );
        assert_eq!(err.url(), Some("https://www.furaffinity.net/gallery/foo/1/"));
    }

    #[test]
    fn test_system_message_is_verbatim() {
        let err = ScraperError::System {
            url: "https://www.furaffinity.net/user/nobody/".to_string(),
            message: "This user cannot be found.".to_string(),
        };
        assert_eq!(err.to_string(), "This user cannot be found.");
    }

    #[test]
    fn test_invalid_url_has_no_page() {
        assert!(ScraperError::InvalidUrl("::".to_string()).url().is_none());
    }
}
