//! Admin write paths
//!
//! Validation lives here; storage does the transactional writes. Every
//! error is typed and surfaced to the admin API.

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::{MflixError, Result};
use crate::services::catalog::{CatalogService, ContentDetail, ContentPage};
use crate::storage::{
    Ad, AdType, CatalogStats, Content, ContentFilter, Country, Episode, Genre, NewAd,
    NewContent, NewDownloadLink, NewEpisode, NewTrailer, SeaOrmStorage,
};
use crate::utils::url_validator::validate_url;

const MAX_SETTING_KEY_LEN: usize = 64;

fn check_url(field: &str, url: &str) -> Result<()> {
    validate_url(url).map_err(|e| MflixError::validation(format!("{}: {}", field, e)))
}

fn check_optional_url(field: &str, url: Option<&str>) -> Result<()> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => check_url(field, url),
        None => Ok(()),
    }
}

pub fn validate_content(new: &NewContent) -> Result<()> {
    if new.title.trim().is_empty() {
        return Err(MflixError::validation("title cannot be empty"));
    }
    if let Some(rating) = new.rating
        && !(0.0..=10.0).contains(&rating)
    {
        return Err(MflixError::validation("rating must be between 0 and 10"));
    }
    if let Some(year) = new.release_year
        && !(1870..=2100).contains(&year)
    {
        return Err(MflixError::validation(format!(
            "release_year {} is out of range",
            year
        )));
    }
    if let Some(minutes) = new.duration_minutes
        && minutes < 0
    {
        return Err(MflixError::validation("duration_minutes cannot be negative"));
    }
    check_optional_url("poster_url", new.poster_url.as_deref())?;
    check_optional_url("backdrop_url", new.backdrop_url.as_deref())?;
    Ok(())
}

pub fn validate_links(links: &[NewDownloadLink]) -> Result<()> {
    for (i, link) in links.iter().enumerate() {
        if link.quality.trim().is_empty() {
            return Err(MflixError::validation(format!(
                "download_links[{}]: quality cannot be empty",
                i
            )));
        }
        check_url(&format!("download_links[{}].url", i), &link.url)?;
        for (j, mirror) in link.mirrors.iter().enumerate() {
            if mirror.name.trim().is_empty() {
                return Err(MflixError::validation(format!(
                    "download_links[{}].mirrors[{}]: name cannot be empty",
                    i, j
                )));
            }
            check_url(
                &format!("download_links[{}].mirrors[{}].url", i, j),
                &mirror.url,
            )?;
        }
    }
    Ok(())
}

fn validate_trailer(trailer: Option<&NewTrailer>) -> Result<()> {
    match trailer {
        Some(t) => check_url("trailer.url", &t.url),
        None => Ok(()),
    }
}

/// Static checks on an ad; the per-position cap needs the database
pub fn validate_ad(new: &NewAd) -> Result<()> {
    if new.name.trim().is_empty() {
        return Err(MflixError::validation("name cannot be empty"));
    }
    if new.position.trim().is_empty() {
        return Err(MflixError::validation("position cannot be empty"));
    }
    match new.ad_type {
        AdType::RedirectLink => {
            let url = new
                .redirect_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    MflixError::validation("redirect_link ads require a redirect_url")
                })?;
            check_url("redirect_url", url)?;
        }
        _ => check_optional_url("redirect_url", new.redirect_url.as_deref())?,
    }
    check_optional_url("image_url", new.image_url.as_deref())?;
    Ok(())
}

pub fn validate_setting_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_SETTING_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MflixError::validation(format!("Invalid setting key '{}'", key)))
    }
}

pub struct AdminService {
    storage: Arc<SeaOrmStorage>,
    catalog: CatalogService,
    max_redirect_links: u64,
}

impl AdminService {
    pub fn new(storage: Arc<SeaOrmStorage>, max_redirect_links: u64) -> Self {
        Self {
            catalog: CatalogService::new(storage.clone()),
            storage,
            max_redirect_links,
        }
    }

    // ============ Content ============

    pub async fn list_contents(
        &self,
        filter: &ContentFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<ContentPage> {
        self.catalog.list_content(filter, page, page_size).await
    }

    pub async fn get_content(&self, id: i32) -> Result<ContentDetail> {
        self.catalog.get_content_detail(id).await
    }

    pub async fn create_content(
        &self,
        new: &NewContent,
        links: &[NewDownloadLink],
        trailer: Option<&NewTrailer>,
    ) -> Result<Content> {
        validate_content(new)?;
        validate_links(links)?;
        validate_trailer(trailer)?;
        self.storage.create_content(new, links, trailer).await
    }

    pub async fn update_content(
        &self,
        id: i32,
        new: &NewContent,
        links: Option<&[NewDownloadLink]>,
        trailer: Option<Option<&NewTrailer>>,
    ) -> Result<Content> {
        validate_content(new)?;
        if let Some(links) = links {
            validate_links(links)?;
        }
        validate_trailer(trailer.flatten())?;
        self.storage.update_content(id, new, links, trailer).await
    }

    pub async fn delete_content(&self, id: i32) -> Result<()> {
        self.storage.delete_content(id).await
    }

    // ============ Episodes ============

    pub async fn list_episodes(&self, content_id: i32) -> Result<Vec<Episode>> {
        if self.storage.get_content(content_id).await?.is_none() {
            return Err(MflixError::not_found(format!(
                "Content {} not found",
                content_id
            )));
        }
        self.storage.list_episodes(content_id).await
    }

    pub async fn create_episode(
        &self,
        content_id: i32,
        new: &NewEpisode,
        links: &[NewDownloadLink],
    ) -> Result<Episode> {
        if new.season_number < 1 || new.episode_number < 1 {
            return Err(MflixError::validation(
                "season_number and episode_number start at 1",
            ));
        }
        validate_links(links)?;
        self.storage.create_episode(content_id, new, links).await
    }

    pub async fn delete_episode(&self, id: i32) -> Result<()> {
        self.storage.delete_episode(id).await
    }

    // ============ Ads / redirect links ============

    pub async fn list_ads(&self) -> Result<Vec<Ad>> {
        self.storage.list_all_ads().await
    }

    /// 每个位置最多 N 个启用的跳转链接
    async fn check_redirect_capacity(&self, new: &NewAd, exclude_id: Option<i32>) -> Result<()> {
        if new.ad_type != AdType::RedirectLink || !new.is_active {
            return Ok(());
        }
        let active = self
            .storage
            .count_active_redirect_links(new.position.trim(), exclude_id)
            .await?;
        if active >= self.max_redirect_links {
            warn!(
                "Rejected redirect link for '{}': {} already active",
                new.position, active
            );
            return Err(MflixError::conflict(format!(
                "Position '{}' already has {} active redirect links (max {})",
                new.position.trim(),
                active,
                self.max_redirect_links
            )));
        }
        Ok(())
    }

    pub async fn create_ad(&self, new: &NewAd) -> Result<Ad> {
        validate_ad(new)?;
        self.check_redirect_capacity(new, None).await?;
        self.storage.create_ad(new).await
    }

    pub async fn update_ad(&self, id: i32, new: &NewAd) -> Result<Ad> {
        validate_ad(new)?;
        if self.storage.get_ad(id).await?.is_none() {
            return Err(MflixError::not_found(format!("Ad {} not found", id)));
        }
        self.check_redirect_capacity(new, Some(id)).await?;
        self.storage.update_ad(id, new).await
    }

    pub async fn delete_ad(&self, id: i32) -> Result<()> {
        self.storage.delete_ad(id).await
    }

    // ============ Reference data ============

    pub async fn list_genres(&self) -> Result<Vec<Genre>> {
        self.storage.list_genres().await
    }

    pub async fn create_genre(&self, name: &str) -> Result<Genre> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MflixError::validation("genre name cannot be empty"));
        }
        self.storage.create_genre(name).await
    }

    pub async fn delete_genre(&self, id: i32) -> Result<()> {
        self.storage.delete_genre(id).await
    }

    pub async fn list_countries(&self) -> Result<Vec<Country>> {
        self.storage.list_countries().await
    }

    pub async fn create_country(&self, name: &str, code: Option<&str>) -> Result<Country> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MflixError::validation("country name cannot be empty"));
        }
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        if let Some(code) = code
            && (code.len() > 3 || !code.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(MflixError::validation(format!(
                "Invalid country code '{}'",
                code
            )));
        }
        self.storage.create_country(name, code).await
    }

    pub async fn delete_country(&self, id: i32) -> Result<()> {
        self.storage.delete_country(id).await
    }

    // ============ Settings / stats ============

    pub async fn put_setting(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        validate_setting_key(key)?;
        self.storage.put_setting(key, value).await?;
        info!("Setting '{}' updated", key);
        Ok(())
    }

    pub async fn stats(&self) -> Result<CatalogStats> {
        self.storage.get_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ContentType, NewMirror, SourceType};

    fn content(title: &str) -> NewContent {
        NewContent {
            title: title.to_string(),
            description: None,
            content_type: ContentType::Movie,
            release_year: Some(2010),
            rating: Some(8.8),
            genre: None,
            country: None,
            poster_url: None,
            backdrop_url: None,
            duration_minutes: Some(148),
            is_featured: false,
        }
    }

    fn redirect_ad(url: Option<&str>) -> NewAd {
        NewAd {
            name: "sponsor".to_string(),
            ad_type: AdType::RedirectLink,
            position: "download_cta_1".to_string(),
            image_url: None,
            html_code: None,
            redirect_url: url.map(String::from),
            is_active: true,
            display_order: 0,
        }
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content(&content("Inception")).is_ok());
        assert!(validate_content(&content("  ")).is_err());

        let mut bad = content("X");
        bad.rating = Some(11.0);
        assert!(validate_content(&bad).is_err());

        let mut bad = content("X");
        bad.poster_url = Some("javascript:alert(1)".into());
        assert!(validate_content(&bad).is_err());
    }

    #[test]
    fn test_validate_links_checks_mirrors() {
        let mut link = NewDownloadLink {
            quality: "1080p".into(),
            file_size: None,
            source_type: SourceType::Free,
            url: "https://cdn.example.com/a.mkv".into(),
            mirrors: vec![NewMirror {
                name: "Mirror 1".into(),
                url: "https://mirror.example.com/a.mkv".into(),
            }],
        };
        assert!(validate_links(std::slice::from_ref(&link)).is_ok());

        link.mirrors[0].url = "not a url".into();
        let err = validate_links(&[link]).unwrap_err();
        assert!(err.message().contains("mirrors[0]"));
    }

    #[test]
    fn test_redirect_link_requires_http_url() {
        assert!(validate_ad(&redirect_ad(Some("https://ads.example.com/c"))).is_ok());
        assert!(validate_ad(&redirect_ad(None)).is_err());
        assert!(validate_ad(&redirect_ad(Some("ftp://ads.example.com"))).is_err());

        let mut banner = redirect_ad(None);
        banner.ad_type = AdType::Banner;
        assert!(validate_ad(&banner).is_ok());
    }

    #[test]
    fn test_setting_key() {
        assert!(validate_setting_key("contentDisplaySettings").is_ok());
        assert!(validate_setting_key("header.config").is_ok());
        assert!(validate_setting_key("").is_err());
        assert!(validate_setting_key("a b").is_err());
    }
}
