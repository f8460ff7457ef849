//! Data extracted from FA pages.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub name: String,
    pub profile_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Watch {
    pub watch_id: String,
    pub profile_name: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notifications {
    pub current_user: CurrentUser,
    pub new_watches: Vec<Watch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub id: String,
    pub title: String,
    pub link: String,
    pub thumbnail: Option<String>,
    pub rating: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GalleryFolder {
    #[default]
    Gallery,
    Scraps,
}

impl GalleryFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Scraps => "scraps",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    Relevancy,
    Date,
    Popularity,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevancy => "relevancy",
            Self::Date => "date",
            Self::Popularity => "popularity",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "relevancy" => Some(Self::Relevancy),
            "date" => Some(Self::Date),
            "popularity" => Some(Self::Popularity),
            _ => None,
        }
    }
}

/// Page sizes the FA search form accepts.
pub const SEARCH_PAGE_SIZES: [u32; 3] = [24, 48, 72];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    pub page: u32,
    pub perpage: u32,
    pub order_by: OrderBy,
}

impl SearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            page: 1,
            perpage: SEARCH_PAGE_SIZES[1],
            order_by: OrderBy::default(),
        }
    }
}
