use reqwest::header::{COOKIE, HeaderValue, LOCATION, SERVER, SET_COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::ScraperError;
use crate::models::{GalleryFolder, Notifications, SearchQuery, Submission};
use crate::utils;

/// Handle for fetching FA pages on behalf of one caller.
///
/// A handle is cheap: it clones the shared [`Client`] (a pooled transport)
/// and owns the cookie and safe-for-work flag it was built with. Build one per
/// request and let it drop with the request; nothing on the handle can be
/// changed after construction.
#[derive(Debug, Clone)]
pub struct Furaffinity {
    client: Client,
    base_url: Url,
    cookie: Option<String>,
    safe_for_work: bool,
}

impl Furaffinity {
    pub const BASE_URL: &str = "https://www.furaffinity.net";

    pub fn new(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            cookie: None,
            safe_for_work: false,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_safe_for_work(mut self, safe_for_work: bool) -> Self {
        self.safe_for_work = safe_for_work;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The `Cookie` header sent with every request from this handle.
    pub fn cookie_header(&self) -> Option<String> {
        match (self.cookie.as_deref(), self.safe_for_work) {
            (Some(cookie), true) => Some(format!("{cookie}; sfw=1")),
            (Some(cookie), false) => Some(cookie.to_string()),
            (None, true) => Some("sfw=1".to_string()),
            (None, false) => None,
        }
    }

    fn url(&self, path: &str) -> Result<Url, ScraperError> {
        self.base_url
            .join(path)
            .map_err(|e| ScraperError::InvalidUrl(format!("{path}: {e}")))
    }

    /// `/{folder}/{user}/{page}/`, with `user` kept to a single path segment.
    fn folder_url(
        &self,
        user: &str,
        folder: GalleryFolder,
        page: u32,
    ) -> Result<Url, ScraperError> {
        if !utils::is_valid_username(user) {
            return Err(ScraperError::InvalidUrl(format!("invalid user name '{user}'")));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ScraperError::InvalidUrl("base URL cannot carry a path".to_string()))?
            .clear()
            .extend([folder.as_str(), user, &page.to_string(), ""]);
        url.set_query(None);
        Ok(url)
    }

    fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        match self
            .cookie_header()
            .and_then(|value| HeaderValue::from_str(&value).ok())
        {
            Some(value) => builder.header(COOKIE, value),
            None => builder,
        }
    }

    /// Fetch a page and run the checks every FA page goes through.
    async fn fetch_page(
        &self,
        request: RequestBuilder,
        url: &Url,
        require_login: bool,
    ) -> Result<String, ScraperError> {
        let response = self.with_headers(request).send().await?;
        let status = response.status();
        let server = response
            .headers()
            .get(SERVER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "Fetched FA page");

        let url = url.to_string();

        if utils::is_cloudflare_challenge(status.as_u16(), server.as_deref(), &body) {
            return Err(ScraperError::Cloudflare { url });
        }

        if status.is_redirection() {
            if require_login && location.as_deref().is_some_and(|l| l.contains("/login")) {
                return Err(ScraperError::Login { url });
            }
            return Err(ScraperError::Status {
                url,
                status: status.as_u16(),
            });
        }

        if status != StatusCode::OK {
            return Err(ScraperError::Status {
                url,
                status: status.as_u16(),
            });
        }

        if let Some(message) = utils::system_message(&body) {
            return Err(ScraperError::System { url, message });
        }

        if require_login && utils::current_user(&body).is_none() {
            return Err(ScraperError::Login { url });
        }

        Ok(body)
    }

    /// Log in with a username and password, returning the session cookie string.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ScraperError> {
        let url = self.url("/login/")?;
        let response = self
            .client
            .post(url.clone())
            .form(&[("action", "login"), ("name", username), ("pass", password)])
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ScraperError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut a = None;
        let mut b = None;
        for value in response.headers().get_all(SET_COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let Some(pair) = value.split(';').next() else {
                continue;
            };
            match pair.trim().split_once('=') {
                Some(("a", token)) if !token.is_empty() => a = Some(token.to_string()),
                Some(("b", token)) if !token.is_empty() => b = Some(token.to_string()),
                _ => {}
            }
        }

        match (a, b) {
            (Some(a), Some(b)) => Ok(format!("b={b}; a={a}")),
            _ => Err(ScraperError::Login {
                url: url.to_string(),
            }),
        }
    }

    pub async fn notifications(
        &self,
        include_deleted: bool,
    ) -> Result<Notifications, ScraperError> {
        let url = self.url("/msg/others/")?;
        let body = self
            .fetch_page(self.client.get(url.clone()), &url, true)
            .await?;

        let current_user =
            utils::current_user(&body).ok_or_else(|| ScraperError::Login {
                url: url.to_string(),
            })?;

        Ok(Notifications {
            current_user,
            new_watches: utils::watches(&body, include_deleted),
        })
    }

    pub async fn gallery(
        &self,
        user: &str,
        folder: GalleryFolder,
        page: u32,
    ) -> Result<Vec<Submission>, ScraperError> {
        let url = self.folder_url(user, folder, page)?;
        let body = self
            .fetch_page(self.client.get(url.clone()), &url, false)
            .await?;
        Ok(utils::submissions(&body, self.base_url.as_str()))
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Submission>, ScraperError> {
        let url = self.url("/search/")?;
        let page = query.page.to_string();
        let perpage = query.perpage.to_string();
        let form = [
            ("q", query.q.as_str()),
            ("page", page.as_str()),
            ("perpage", perpage.as_str()),
            ("order-by", query.order_by.as_str()),
            ("order-direction", "desc"),
            ("do_search", "Search"),
        ];
        let body = self
            .fetch_page(self.client.post(url.clone()).form(&form), &url, false)
            .await?;

        if let Some(message) = utils::search_error(&body) {
            return Err(ScraperError::Form {
                url: url.to_string(),
                message,
            });
        }

        Ok(utils::submissions(&body, self.base_url.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> Furaffinity {
        crate::client::install_rustls_provider();
        Furaffinity::new(Client::new(), Url::parse(Furaffinity::BASE_URL).unwrap())
    }

    #[test]
    fn test_cookie_header() {
        assert_eq!(handle().cookie_header(), None);
        assert_eq!(
            handle().with_safe_for_work(true).cookie_header().as_deref(),
            Some("sfw=1")
        );

        let fa = handle().with_cookie("b=1111-aaaa; a=2222-bbbb");
        assert_eq!(
            fa.cookie_header().as_deref(),
            Some("b=1111-aaaa; a=2222-bbbb")
        );
        assert_eq!(
            fa.with_safe_for_work(true).cookie_header().as_deref(),
            Some("b=1111-aaaa; a=2222-bbbb; sfw=1")
        );
    }

    #[test]
    fn test_handles_do_not_share_session() {
        let shared = handle();
        let first = shared.clone().with_cookie("a=1; b=2");
        let second = shared.clone().with_cookie("a=3; b=4").with_safe_for_work(true);

        assert_eq!(first.cookie_header().as_deref(), Some("a=1; b=2"));
        assert_eq!(second.cookie_header().as_deref(), Some("a=3; b=4; sfw=1"));
        assert_eq!(shared.cookie_header(), None);
    }

    #[test]
    fn test_url_join() {
        let url = handle().url("/gallery/someone/2/").unwrap();
        assert_eq!(url.as_str(), "https://www.furaffinity.net/gallery/someone/2/");
    }

    #[test]
    fn test_folder_url() {
        let url = handle()
            .folder_url("some_user", GalleryFolder::Scraps, 2)
            .unwrap();
        assert_eq!(url.as_str(), "https://www.furaffinity.net/scraps/some_user/2/");
    }

    #[test]
    fn test_folder_url_rejects_path_tricks() {
        for user in ["../../msg/submissions", "..", ".", "foo?x=", "a/b", "a#b", ""] {
            assert!(
                matches!(
                    handle().folder_url(user, GalleryFolder::Gallery, 1),
                    Err(ScraperError::InvalidUrl(_))
                ),
                "{user}"
            );
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_gallery_live() {
        let client = crate::default_client(crate::DEFAULT_TIMEOUT).unwrap();
        let fa = Furaffinity::new(client, Url::parse(Furaffinity::BASE_URL).unwrap());
        let submissions = fa.gallery("fender", GalleryFolder::Gallery, 1).await.unwrap();
        println!("{submissions:?}");
    }
}
