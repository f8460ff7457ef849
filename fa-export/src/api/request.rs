//! Request lifecycle shared by the document routes.
//!
//! validate → resolve credential → build session → cache lookup → fetch →
//! render → cache write → respond. Errors at any step are classified and
//! rendered in the requested format.

use std::future::Future;

use axum::{
    extract::rejection::QueryRejection,
    http::{HeaderMap, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::Result;
use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::cache::{CacheKey, TtlClass};
use crate::error::{Error, ErrorKind, FaError};
use crate::format::ResponseFormat;
use crate::session::{CredentialOrigin, SessionContext};

/// Header names the caller's cookie is accepted under.
pub const COOKIE_HEADERS: [&str; 2] = ["fa_cookie", "fa-cookie"];

pub const LOGIN_REQUIRED_MESSAGE: &str = "You must provide a valid login cookie in the header \
     \"FA_COOKIE\". Please note this is a header, not a cookie.";

/// What a document route reads from the request before doing any work.
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    pub format: ResponseFormat,
    pub cookie: Option<String>,
    pub safe_for_work: bool,
}

impl DocumentRequest {
    /// `sfw` selects safe-for-work mode when present, whatever its value.
    pub fn new(format: ResponseFormat, headers: &HeaderMap, sfw: Option<&str>) -> Self {
        let cookie = COOKIE_HEADERS
            .iter()
            .find_map(|name| headers.get(*name))
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

        Self {
            format,
            cookie,
            safe_for_work: sfw.is_some(),
        }
    }

    /// Whose credential the request runs with, known before it is validated.
    pub fn origin(&self) -> CredentialOrigin {
        if self.cookie.is_some() {
            CredentialOrigin::Caller
        } else {
            CredentialOrigin::System
        }
    }

    /// Classify and render a failure for this request.
    pub fn fail(&self, err: impl Into<Error>) -> Response {
        ApiError::from_error(err.into(), self.origin())
            .with_format(self.format)
            .into_response()
    }
}

/// Who may read a resource and how its cache entries are partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Same document for every caller in a scope.
    Public,
    /// Needs the caller's own cookie; cached per session.
    Authenticated,
}

#[derive(Debug, Clone)]
pub struct Resource {
    path: String,
    access: Access,
}

impl Resource {
    pub fn public(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            access: Access::Public,
        }
    }

    pub fn authenticated(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            access: Access::Authenticated,
        }
    }

    fn cache_path(&self, session: &SessionContext) -> String {
        match self.access {
            Access::Public => self.path.clone(),
            Access::Authenticated => {
                format!("{}:{}", self.path, session.credential().digest())
            }
        }
    }
}

/// Serve a document through the cache, computing it with `compute` on a miss.
pub async fn respond<F, Fut>(
    state: &AppState,
    request: &DocumentRequest,
    resource: Resource,
    compute: F,
) -> Response
where
    F: FnOnce(SessionContext) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    match serve(state, request, resource, compute).await {
        Ok(body) => document(request.format, body),
        Err(err) => request.fail(err),
    }
}

async fn serve<F, Fut>(
    state: &AppState,
    request: &DocumentRequest,
    resource: Resource,
    compute: F,
) -> Result<String>
where
    F: FnOnce(SessionContext) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    if resource.access == Access::Authenticated && request.cookie.is_none() {
        return Err(FaError::login_cookie(LOGIN_REQUIRED_MESSAGE).into());
    }

    let resolved = state.resolver.resolve(request.cookie.as_deref()).await?;
    let session = SessionContext::new(resolved, request.safe_for_work);

    let key = CacheKey::new(
        &resource.cache_path(&session),
        request.safe_for_work,
        request.format,
    );

    state
        .cache
        .get_or_compute(&key, TtlClass::for_format(request.format), || {
            compute(session)
        })
        .await
}

pub fn document(format: ResponseFormat, body: String) -> Response {
    ([(CONTENT_TYPE, format.content_type())], body).into_response()
}

/// A query string that could not be read at all, e.g. a repeated parameter.
pub fn query_error(kind: ErrorKind, rejection: QueryRejection) -> FaError {
    FaError::new(kind, format!("Invalid query string: {}", rejection.body_text()))
}

/// Parse the `page` query parameter. Absent means the first page.
pub fn parse_page(page: Option<&str>) -> std::result::Result<u32, FaError> {
    let Some(raw) = page else {
        return Ok(1);
    };
    match raw.trim().parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(FaError::offset(format!(
            "Page must be a positive integer, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_cookie_header_names() {
        let mut headers = HeaderMap::new();
        headers.insert("fa_cookie", HeaderValue::from_static("b=1; a=2"));
        let request = DocumentRequest::new(ResponseFormat::Json, &headers, None);
        assert_eq!(request.cookie.as_deref(), Some("b=1; a=2"));
        assert_eq!(request.origin(), CredentialOrigin::Caller);

        let mut headers = HeaderMap::new();
        headers.insert("fa-cookie", HeaderValue::from_static("b=3; a=4"));
        let request = DocumentRequest::new(ResponseFormat::Json, &headers, None);
        assert_eq!(request.cookie.as_deref(), Some("b=3; a=4"));

        let request = DocumentRequest::new(ResponseFormat::Json, &HeaderMap::new(), None);
        assert_eq!(request.origin(), CredentialOrigin::System);
    }

    #[test]
    fn test_sfw_presence() {
        let headers = HeaderMap::new();
        assert!(DocumentRequest::new(ResponseFormat::Rss, &headers, Some("1")).safe_for_work);
        assert!(DocumentRequest::new(ResponseFormat::Rss, &headers, Some("")).safe_for_work);
        assert!(!DocumentRequest::new(ResponseFormat::Rss, &headers, None).safe_for_work);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None).unwrap(), 1);
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
        for bad in ["0", "-1", "two", "", "1.5"] {
            assert_eq!(parse_page(Some(bad)).unwrap_err().kind, ErrorKind::Offset);
        }
    }
}
