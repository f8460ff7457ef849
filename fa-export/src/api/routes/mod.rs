//! API route modules.

pub mod health;
pub mod home;
pub mod notifications;
pub mod search;
pub mod user;

use axum::{Router, routing::get};
use fa_scraper::Submission;

use crate::api::server::AppState;
use crate::format::{Channel, FeedItem};

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/{file}", get(search::search))
        .nest("/notifications", notifications::router())
        .nest("/user", user::router())
        .nest("/health", health::router())
        .with_state(state)
}

/// Build an RSS channel from a list of submissions, keeping at most `limit`.
pub(crate) fn submission_channel(
    title: String,
    link: String,
    description: String,
    submissions: &[Submission],
    limit: usize,
) -> Channel {
    let items = submissions
        .iter()
        .take(limit)
        .map(|submission| FeedItem {
            title: submission.title.clone(),
            link: submission.link.clone(),
            guid: submission.link.clone(),
            description: submission
                .thumbnail
                .as_ref()
                .map(|thumb| format!("<img src=\"{thumb}\" alt=\"{}\"/>", submission.title)),
        })
        .collect();

    Channel {
        title,
        link,
        description,
        items,
    }
}

/// Public FA link for a site-relative path.
pub(crate) fn site_link(state: &AppState, path: &str) -> String {
    format!(
        "{}{}",
        state.config.upstream.base_url.as_str().trim_end_matches('/'),
        path
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(id: u32, thumbnail: Option<&str>) -> Submission {
        Submission {
            id: id.to_string(),
            title: format!("Submission {id}"),
            link: format!("https://www.furaffinity.net/view/{id}/"),
            thumbnail: thumbnail.map(str::to_string),
            rating: "general".to_string(),
        }
    }

    #[test]
    fn test_channel_respects_limit() {
        let submissions: Vec<_> = (1..=5).map(|id| submission(id, None)).collect();
        let channel = submission_channel(
            "t".to_string(),
            "l".to_string(),
            "d".to_string(),
            &submissions,
            3,
        );
        assert_eq!(channel.items.len(), 3);
        assert_eq!(channel.items[0].guid, "https://www.furaffinity.net/view/1/");
        assert!(channel.items[0].description.is_none());
    }

    #[test]
    fn test_channel_item_thumbnail() {
        let submissions = [submission(7, Some("https://t.furaffinity.net/7.jpg"))];
        let channel = submission_channel(
            "t".to_string(),
            "l".to_string(),
            "d".to_string(),
            &submissions,
            10,
        );
        assert!(
            channel.items[0]
                .description
                .as_deref()
                .unwrap()
                .contains("https://t.furaffinity.net/7.jpg")
        );
    }
}
