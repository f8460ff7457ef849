//! Output formats and document rendering.

use serde::Serialize;

use crate::{Error, Result};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Format selected by the file suffix of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    Json,
    Xml,
    Rss,
}

impl ResponseFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "rss" => Some(Self::Rss),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Rss => "rss",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=utf-8",
            Self::Xml => "application/xml; charset=utf-8",
            Self::Rss => "application/rss+xml; charset=utf-8",
        }
    }
}

/// Split a route's file segment into its stem and format.
///
/// `"others.json"` becomes `("others", Json)`. Only the formats in `allowed`
/// are accepted; anything else is `None`.
pub fn split_file<'a>(
    file: &'a str,
    allowed: &[ResponseFormat],
) -> Option<(&'a str, ResponseFormat)> {
    let (stem, ext) = file.rsplit_once('.')?;
    let format = ResponseFormat::from_extension(ext)?;
    allowed.contains(&format).then_some((stem, format))
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_xml<T: Serialize + ?Sized>(root: &str, value: &T) -> Result<String> {
    let body = quick_xml::se::to_string_with_root(root, value)
        .map_err(|e| Error::Render(e.to_string()))?;
    Ok(format!("{XML_DECLARATION}{body}"))
}

/// Render a structured document.
///
/// Feeds have their own shape and go through [`render_rss`]; `Rss` here
/// renders plain XML, which is what error bodies on feed routes use.
pub fn render_document<T: Serialize + ?Sized>(
    format: ResponseFormat,
    root: &str,
    value: &T,
) -> Result<String> {
    match format {
        ResponseFormat::Json => render_json(value),
        ResponseFormat::Xml | ResponseFormat::Rss => render_xml(root, value),
    }
}

/// Wraps a list so each element renders as its own `<submission>` element.
#[derive(Serialize)]
pub struct SubmissionList<'a, T> {
    submission: &'a [T],
}

impl<'a, T: Serialize> SubmissionList<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self { submission: items }
    }
}

/// RSS 2.0 channel.
#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    #[serde(rename = "item")]
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub guid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize)]
struct Rss<'a> {
    #[serde(rename = "@version")]
    version: &'static str,
    channel: &'a Channel,
}

pub fn render_rss(channel: &Channel) -> Result<String> {
    render_xml(
        "rss",
        &Rss {
            version: "2.0",
            channel,
        },
    )
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: String,
        title: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                id: "1".to_string(),
                title: "First & best".to_string(),
            },
            Item {
                id: "2".to_string(),
                title: "Second".to_string(),
            },
        ]
    }

    #[test]
    fn test_split_file() {
        use ResponseFormat::*;
        assert_eq!(split_file("others.json", &[Json, Xml]), Some(("others", Json)));
        assert_eq!(split_file("gallery.rss", &[Json, Xml, Rss]), Some(("gallery", Rss)));
        assert_eq!(split_file("others.rss", &[Json, Xml]), None);
        assert_eq!(split_file("others.html", &[Json, Xml]), None);
        assert_eq!(split_file("others", &[Json, Xml]), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            ResponseFormat::Json.content_type(),
            "application/json; charset=utf-8"
        );
        assert_eq!(
            ResponseFormat::Rss.content_type(),
            "application/rss+xml; charset=utf-8"
        );
    }

    #[test]
    fn test_render_json_is_pretty() {
        let json = render_json(&items()).unwrap();
        assert!(json.contains("\n  {"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[1]["title"], "Second");
    }

    #[test]
    fn test_render_xml_list() {
        let items = items();
        let xml = render_xml("submissions", &SubmissionList::new(&items)).unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        assert_eq!(xml.matches("<submission>").count(), 2);
        assert!(xml.contains("<title>First &amp; best</title>"));
        assert!(xml.contains("<submissions>"));
    }

    #[test]
    fn test_render_rss() {
        let channel = Channel {
            title: "Gallery".to_string(),
            link: "https://www.furaffinity.net/gallery/someone/".to_string(),
            description: "Latest".to_string(),
            items: vec![FeedItem {
                title: "One".to_string(),
                link: "https://www.furaffinity.net/view/1/".to_string(),
                guid: "https://www.furaffinity.net/view/1/".to_string(),
                description: None,
            }],
        };
        let rss = render_rss(&channel).unwrap();
        assert!(rss.contains("<rss version=\"2.0\">"));
        assert!(rss.contains("<channel>"));
        assert_eq!(rss.matches("<item>").count(), 1);
    }
}
