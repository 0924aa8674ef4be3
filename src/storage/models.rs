use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContentType {
    #[default]
    Movie,
    Series,
    Anime,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SourceType {
    /// Routed through the ad interstitial
    Free,
    Premium,
    #[default]
    Direct,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdType {
    #[default]
    Banner,
    Popup,
    Native,
    RedirectLink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    pub genre: Option<String>,
    pub country: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadMirror {
    pub id: i32,
    pub download_link_id: i32,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadLink {
    pub id: i32,
    pub content_id: i32,
    pub episode_id: Option<i32>,
    pub quality: String,
    pub file_size: Option<String>,
    pub source_type: SourceType,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub mirrors: Vec<DownloadMirror>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: i32,
    pub content_id: i32,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trailer {
    pub id: i32,
    pub content_id: i32,
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    pub id: i32,
    pub name: String,
    pub ad_type: AdType,
    pub position: String,
    pub image_url: Option<String>,
    pub html_code: Option<String>,
    pub redirect_url: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

/// An active `redirect_link` ad, reduced to what the redirect loop needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectLink {
    pub id: i32,
    pub position: String,
    pub redirect_url: String,
    pub is_active: bool,
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: i32,
    pub name: String,
    pub code: Option<String>,
}

// ============================================================
// Write payloads
// ============================================================

/// Scalar fields of a content row, used for create, update and CSV import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content_type: ContentType,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMirror {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDownloadLink {
    pub quality: String,
    #[serde(default)]
    pub file_size: Option<String>,
    #[serde(default)]
    pub source_type: SourceType,
    pub url: String,
    #[serde(default)]
    pub mirrors: Vec<NewMirror>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrailer {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEpisode {
    #[serde(default = "default_season")]
    pub season_number: i32,
    pub episode_number: i32,
    #[serde(default)]
    pub title: Option<String>,
}

fn default_season() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAd {
    pub name: String,
    pub ad_type: AdType,
    pub position: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub html_code: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i32,
}

fn default_true() -> bool {
    true
}

/// 内容列表过滤条件
#[derive(Default, Clone, Debug, Deserialize)]
pub struct ContentFilter {
    pub content_type: Option<ContentType>,
    /// Substring match on the comma-separated genre column
    pub genre: Option<String>,
    pub country: Option<String>,
    pub featured: Option<bool>,
}

/// Raw row counts for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub movies: u64,
    pub series: u64,
    pub anime: u64,
    pub episodes: u64,
    pub download_links: u64,
    pub ads_total: u64,
    pub ads_active: u64,
    pub redirect_links: u64,
}
