//! API error handling.
//!
//! Maps classified failures to HTTP statuses and renders the error body in
//! the format the caller asked for.

use axum::{
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{Error, ErrorKind};
use crate::format::{self, ResponseFormat};
use crate::session::CredentialOrigin;

/// Body returned for unexpected failures. Nothing internal is exposed.
pub const INTERNAL_ERROR_MESSAGE: &str = "FAExport encounter an internal error";

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub url: Option<String>,
}

/// HTTP status for a classified failure.
///
/// A login failure is the caller's problem (401) when they supplied the
/// cookie, and ours (503) when the system session was in use.
pub fn classify(kind: ErrorKind, origin: CredentialOrigin) -> StatusCode {
    match kind {
        ErrorKind::Search | ErrorKind::LoginCookie | ErrorKind::Form | ErrorKind::Offset => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Login => match origin {
            CredentialOrigin::Caller => StatusCode::UNAUTHORIZED,
            CredentialOrigin::System => StatusCode::SERVICE_UNAVAILABLE,
        },
        ErrorKind::System => StatusCode::NOT_FOUND,
        ErrorKind::Status => StatusCode::BAD_GATEWAY,
        ErrorKind::Cloudflare => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Cache => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub url: Option<String>,
    pub format: ResponseFormat,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            url: None,
            format: ResponseFormat::Json,
        }
    }

    /// Create an opaque 500 Internal Server Error.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    /// Classify an application error raised while serving a request.
    pub fn from_error(err: Error, origin: CredentialOrigin) -> Self {
        match err {
            Error::Fa(fa) => {
                let status = classify(fa.kind, origin);
                if status.is_server_error() {
                    warn!(kind = %fa.kind, url = ?fa.url, "{}", fa.message);
                } else {
                    debug!(kind = %fa.kind, url = ?fa.url, "{}", fa.message);
                }
                Self {
                    status,
                    message: fa.message,
                    url: fa.url,
                    format: ResponseFormat::Json,
                }
            }
            other => {
                error!(error = %other, "Unexpected error while serving request");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            error: self.message,
            url: self.url,
        };
        match format::render_document(self.format, "response", &body) {
            Ok(rendered) => (
                self.status,
                [(CONTENT_TYPE, self.format.content_type())],
                rendered,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "Failed to render error body");
                (self.status, body.error).into_response()
            }
        }
    }
}
