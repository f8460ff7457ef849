//! Site search.

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use fa_scraper::{OrderBy, SEARCH_PAGE_SIZES, SearchQuery};
use serde::Deserialize;

use crate::api::request::{DocumentRequest, Resource, parse_page, query_error, respond};
use crate::api::routes::{site_link, submission_channel};
use crate::api::server::AppState;
use crate::error::{ErrorKind, FaError};
use crate::format::{self, ResponseFormat, SubmissionList, split_file};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub perpage: Option<String>,
    pub order_by: Option<String>,
    pub sfw: Option<String>,
}

/// Validate search parameters into a query. Page errors are offset errors;
/// everything else is a search error.
pub fn build_query(params: &SearchParams) -> Result<SearchQuery, FaError> {
    let q = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| FaError::search("Search query 'q' must be provided"))?;

    let mut query = SearchQuery::new(q);
    query.page = parse_page(params.page.as_deref())?;

    if let Some(perpage) = params.perpage.as_deref() {
        query.perpage = perpage
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| SEARCH_PAGE_SIZES.contains(n))
            .ok_or_else(|| {
                FaError::search(format!(
                    "perpage must be one of {SEARCH_PAGE_SIZES:?}, got '{perpage}'"
                ))
            })?;
    }

    if let Some(order_by) = params.order_by.as_deref() {
        query.order_by = OrderBy::parse(order_by.trim()).ok_or_else(|| {
            FaError::search(format!(
                "order_by must be one of relevancy, date, popularity, got '{order_by}'"
            ))
        })?;
    }

    Ok(query)
}

/// `GET /search.{json,xml,rss}`
pub async fn search(
    State(state): State<AppState>,
    Path(file): Path<String>,
    query: Result<Query<SearchParams>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let allowed = [ResponseFormat::Json, ResponseFormat::Xml, ResponseFormat::Rss];
    let Some(("search", format)) = split_file(&file, &allowed) else {
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
    let query = match build_query(&params) {
        Ok(query) => query,
        Err(e) => return request.fail(e),
    };

    // Free-text query goes last so it cannot collide with the fixed fields.
    let resource = Resource::public(format!(
        "/search:{}:{}:{}:{}",
        query.page,
        query.perpage,
        query.order_by.as_str(),
        query.q
    ));
    let upstream = state.upstream.clone();
    let rss_limit = state.config.rss_limit;
    let link = site_link(&state, "/search/");

    respond(&state, &request, resource, move |session| async move {
        let submissions = upstream.search(&session, &query).await?;
        match format {
            ResponseFormat::Json => format::render_json(&submissions),
            ResponseFormat::Xml => {
                format::render_xml("submissions", &SubmissionList::new(&submissions))
            }
            ResponseFormat::Rss => {
                let title = format!("Search for \"{}\"", query.q);
                let description = format!("FurAffinity search results for \"{}\"", query.q);
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
