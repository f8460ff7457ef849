//! Per-user listings.

use axum::{
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use fa_scraper::GalleryFolder;
use serde::Deserialize;

use crate::api::request::{DocumentRequest, Resource, parse_page, query_error, respond};
use crate::api::routes::{site_link, submission_channel};
use crate::api::server::AppState;
use crate::error::{ErrorKind, FaError};
use crate::format::{self, ResponseFormat, SubmissionList, split_file};

pub fn router() -> Router<AppState> {
    Router::new().route("/{name}/{file}", get(folder))
}

#[derive(Debug, Default, Deserialize)]
pub struct FolderParams {
    pub sfw: Option<String>,
    pub page: Option<String>,
}

/// `GET /user/{name}/{gallery,scraps}.{json,xml,rss}`
async fn folder(
    State(state): State<AppState>,
    Path((name, file)): Path<(String, String)>,
    query: Result<Query<FolderParams>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let allowed = [ResponseFormat::Json, ResponseFormat::Xml, ResponseFormat::Rss];
    let (folder, format) = match split_file(&file, &allowed) {
        Some(("gallery", format)) => (GalleryFolder::Gallery, format),
        Some(("scraps", format)) => (GalleryFolder::Scraps, format),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            return DocumentRequest::new(format, &headers, None)
                .fail(query_error(ErrorKind::Offset, rejection));
        }
    };

    let request = DocumentRequest::new(format, &headers, params.sfw.as_deref());
    if !fa_scraper::utils::is_valid_username(&name) {
        return request.fail(FaError::new(
            ErrorKind::System,
            format!("'{name}' is not a valid user name"),
        ));
    }
    let page = match parse_page(params.page.as_deref()) {
        Ok(page) => page,
        Err(e) => return request.fail(e),
    };

    let resource = Resource::public(format!("/user/{name}/{}:{page}", folder.as_str()));
    let upstream = state.upstream.clone();
    let rss_limit = state.config.rss_limit;
    let link = site_link(&state, &format!("/{}/{name}/", folder.as_str()));

    respond(&state, &request, resource, move |session| async move {
        let submissions = upstream.gallery(&session, &name, folder, page).await?;
        match format {
            ResponseFormat::Json => format::render_json(&submissions),
            ResponseFormat::Xml => {
                format::render_xml("submissions", &SubmissionList::new(&submissions))
            }
            ResponseFormat::Rss => {
                let title = match folder {
                    GalleryFolder::Gallery => format!("{name}'s gallery"),
                    GalleryFolder::Scraps => format!("{name}'s scraps"),
                };
                let description = format!("The most recent submissions in {title} on FurAffinity");
                format::render_rss(&submission_channel(
                    title,
                    link,
                    description,
                    &submissions,
                    rss_limit,
                ))
            }
        }
    })
    .await
}
