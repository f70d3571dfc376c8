//! Response envelope and entity shapes returned by the Jikan API.
//!
//! Only the fields callers actually read are modelled; unknown fields are ignored.
//! Most numeric fields are nullable upstream (e.g. airing shows have no episode
//! count yet), so they are `Option`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Upstream identifier (MyAnimeList id).
pub type MalId = u64;

/// `{ data: T, pagination?: ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub last_visible_page: u32,
    pub has_next_page: bool,
    pub current_page: u32,
    pub items: PaginationItems,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationItems {
    pub count: u32,
    pub total: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.last_visible_page
    }
}

/// Search results page.
pub type SearchResponse = ApiResponse<Vec<Anime>>;

/// Single-entity lookup.
pub type DetailResponse = ApiResponse<Anime>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub mal_id: MalId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub images: Images,
    pub title: String,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub aired: Option<Aired>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub members: Option<u64>,
    #[serde(default)]
    pub genres: Vec<RelatedEntity>,
    #[serde(default)]
    pub studios: Vec<RelatedEntity>,
    #[serde(default)]
    pub themes: Vec<RelatedEntity>,
    #[serde(default)]
    pub demographics: Vec<RelatedEntity>,
    #[serde(default)]
    pub producers: Vec<RelatedEntity>,
    #[serde(default)]
    pub licensors: Vec<RelatedEntity>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
}

impl Anime {
    /// Smallest available poster, preferring webp.
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.images
            .webp
            .small_image_url
            .as_deref()
            .or(self.images.jpg.small_image_url.as_deref())
            .or(self.images.webp.image_url.as_deref())
            .or(self.images.jpg.image_url.as_deref())
    }

    /// Genre names joined for display.
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|g| g.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: ImageSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Genre, studio, theme, demographic, producer or licensor reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub mal_id: MalId,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aired {
    #[serde(default)]
    pub from: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub to: Option<DateTime<FixedOffset>>,
    /// Human-readable range, e.g. "Oct 3, 2002 to Feb 8, 2007".
    #[serde(rename = "string", default)]
    pub display: Option<String>,
}
