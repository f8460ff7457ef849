use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

use crate::models::{CurrentUser, Submission, Watch};

static MY_USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<a[^>]*id="my-username"[^>]*>(.*?)</a>"#).unwrap());

static SYSTEM_MESSAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)System Message.*?<div class="(?:redirect-message|section-body)"[^>]*>(.*?)</div>"#,
    )
    .unwrap()
});

static SYSTEM_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)<title>\s*System (?:Error|Message)\s*</title>").unwrap()
});

static CF_CHALLENGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<title>\s*Just a moment\.\.\.\s*</title>|window\._cf_chl_opt\s*=|/cdn-cgi/challenge-platform/"#,
    )
    .unwrap()
});

static FIGURE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<figure([^>]*)>(.*?)</figure>").unwrap());
static SID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"id="sid-(\d+)""#).unwrap());
static RATING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\br-(general|mature|adult)\b").unwrap());
static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]*href="/view/\d+/?"[^>]*title="([^"]*)""#).unwrap()
});
static THUMBNAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]*src="([^"]+)""#).unwrap());

static WATCH_SECTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)id="messages-watches".*?</section>"#).unwrap());
static LIST_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<li[^>]*>(.*?)</li>").unwrap());
static WATCH_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="watches\[\]"[^>]*value="(\d+)""#).unwrap());
static USER_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="/user/([^/"]+)/?""#).unwrap());

static SEARCH_ERROR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div[^>]*class="[^"]*search-error[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_.~\-\[\]^`]+$").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

#[inline]
pub fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Remove markup and collapse surrounding whitespace.
pub fn strip_tags(input: &str) -> String {
    decode_entities(TAG_REGEX.replace_all(input, "").trim())
}

pub fn decode_entities(input: &str) -> String {
    decode_html_entities(input).into_owned()
}

/// Lowercased name with the punctuation FA drops from profile URLs removed.
pub fn profile_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether `name` can be used as a user name in an FA path.
///
/// Names made only of dots are rejected as they would be read as relative
/// path segments.
pub fn is_valid_username(name: &str) -> bool {
    USERNAME_REGEX.is_match(name) && !name.chars().all(|c| c == '.')
}

/// The logged-in user shown in the page header, if the page was served to a session.
pub fn current_user(html: &str) -> Option<CurrentUser> {
    let raw = capture_group_1(&MY_USERNAME_REGEX, html)?;
    let name = strip_tags(raw);
    let name = name.trim_start_matches('~').trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(CurrentUser {
        profile_name: profile_name(&name),
        name,
    })
}

pub fn system_message(html: &str) -> Option<String> {
    if let Some(message) = capture_group_1(&SYSTEM_MESSAGE_REGEX, html) {
        let message = strip_tags(message);
        if !message.is_empty() {
            return Some(message);
        }
    }
    SYSTEM_TITLE_REGEX
        .is_match(html)
        .then(|| "FA returned a system error page".to_string())
}

/// Whether a response is an anti-bot challenge rather than an FA page.
pub fn is_cloudflare_challenge(status: u16, server: Option<&str>, body: &str) -> bool {
    let served_by_cloudflare = server
        .map(|value| value.to_ascii_lowercase().starts_with("cloudflare"))
        .unwrap_or(false);

    (served_by_cloudflare && matches!(status, 403 | 503)) || CF_CHALLENGE_REGEX.is_match(body)
}

pub fn search_error(html: &str) -> Option<String> {
    capture_group_1(&SEARCH_ERROR_REGEX, html)
        .map(strip_tags)
        .filter(|message| !message.is_empty())
}

fn absolute_url(base_url: &str, src: &str) -> String {
    if src.starts_with("//") {
        format!("https:{src}")
    } else if src.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), src)
    } else {
        src.to_string()
    }
}

/// Submissions listed as `<figure id="sid-...">` thumbnails.
pub fn submissions(html: &str, base_url: &str) -> Vec<Submission> {
    FIGURE_REGEX
        .captures_iter(html)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let body = caps.get(2)?.as_str();
            let id = capture_group_1(&SID_REGEX, attrs)?.to_string();
            let rating = capture_group_1(&RATING_REGEX, attrs)
                .unwrap_or("general")
                .to_string();
            let title = capture_group_1(&TITLE_REGEX, body)
                .map(decode_entities)
                .unwrap_or_default();
            let thumbnail =
                capture_group_1(&THUMBNAIL_REGEX, body).map(|src| absolute_url(base_url, src));
            let link = format!("{}/view/{}/", base_url.trim_end_matches('/'), id);

            Some(Submission {
                id,
                title,
                link,
                thumbnail,
                rating,
            })
        })
        .collect()
}

pub fn watches(html: &str, include_deleted: bool) -> Vec<Watch> {
    let Some(section) = WATCH_SECTION_REGEX.find(html) else {
        return Vec::new();
    };

    LIST_ITEM_REGEX
        .captures_iter(section.as_str())
        .filter_map(|caps| {
            let item = caps.get(1)?.as_str();
            let deleted = item.contains("removed by the user");
            if deleted && !include_deleted {
                return None;
            }
            let watch_id = capture_group_1(&WATCH_ID_REGEX, item)?.to_string();
            let profile_name = capture_group_1(&USER_LINK_REGEX, item)
                .unwrap_or_default()
                .to_string();
            Some(Watch {
                watch_id,
                profile_name,
                deleted,
            })
        })
        .collect()
}
