//! The logged-in user's notifications.

use axum::{
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::api::request::{DocumentRequest, Resource, query_error, respond};
use crate::api::server::AppState;
use crate::error::ErrorKind;
use crate::format::{self, ResponseFormat, split_file};

pub fn router() -> Router<AppState> {
    Router::new().route("/{file}", get(others))
}

#[derive(Debug, Default, Deserialize)]
pub struct OthersParams {
    pub sfw: Option<String>,
    pub include_deleted: Option<String>,
}

/// `GET /notifications/others.{json,xml}`
///
/// Always runs with the caller's own cookie; the system session is never
/// used for per-user data.
async fn others(
    State(state): State<AppState>,
    Path(file): Path<String>,
    query: Result<Query<OthersParams>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let Some(("others", format)) =
        split_file(&file, &[ResponseFormat::Json, ResponseFormat::Xml])
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            return DocumentRequest::new(format, &headers, None)
                .fail(query_error(ErrorKind::Search, rejection));
        }
    };

    let request = DocumentRequest::new(format, &headers, params.sfw.as_deref());
    let include_deleted = params.include_deleted.is_some();
    let resource = Resource::authenticated(format!("/notifications/others:{include_deleted}"));
    let upstream = state.upstream.clone();

    respond(&state, &request, resource, move |session| async move {
        let notifications = upstream.notifications(&session, include_deleted).await?;
        format::render_document(format, "results", &notifications)
    })
    .await
}
