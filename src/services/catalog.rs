//! Public catalog reads
//!
//! Listing, detail, search and ad lookup for visitors. Search sub-queries
//! and ad lookups fail open: a storage error is logged and yields nothing.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::errors::{MflixError, Result};
use crate::storage::{
    Ad, Content, ContentFilter, Country, DownloadLink, Episode, Genre, SeaOrmStorage,
    SearchField, Trailer,
};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_SEARCH_LIMIT: u64 = 20;

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentPage {
    pub items: Vec<Content>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityGroup {
    pub quality: String,
    pub links: Vec<DownloadLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeDetail {
    #[serde(flatten)]
    pub episode: Episode,
    pub downloads: Vec<QualityGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentDetail {
    #[serde(flatten)]
    pub content: Content,
    pub trailer: Option<Trailer>,
    pub episodes: Vec<EpisodeDetail>,
    pub downloads: Vec<QualityGroup>,
}

/// 清晰度排序：2160p/4K > 1080p > 720p > 480p > 360p > 其他（按字母）
pub fn quality_rank(quality: &str) -> Option<u8> {
    match quality.trim().to_ascii_lowercase().as_str() {
        "2160p" | "4k" | "uhd" => Some(0),
        "1080p" | "fhd" => Some(1),
        "720p" | "hd" => Some(2),
        "480p" | "sd" => Some(3),
        "360p" => Some(4),
        _ => None,
    }
}

fn compare_quality(a: &str, b: &str) -> Ordering {
    match (quality_rank(a), quality_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Group links by quality string, best quality first, link order kept
pub fn group_by_quality(links: Vec<DownloadLink>) -> Vec<QualityGroup> {
    let mut groups: Vec<QualityGroup> = Vec::new();
    for link in links {
        match groups.iter_mut().find(|g| g.quality == link.quality) {
            Some(group) => group.links.push(link),
            None => groups.push(QualityGroup {
                quality: link.quality.clone(),
                links: vec![link],
            }),
        }
    }
    groups.sort_by(|a, b| compare_quality(&a.quality, &b.quality));
    groups
}

/// Merge result lists in order, first occurrence of an id wins
pub fn merge_unique(lists: Vec<Vec<Content>>, limit: usize) -> Vec<Content> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|c| seen.insert(c.id))
        .take(limit)
        .collect()
}

pub fn clamp_paging(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

pub struct CatalogService {
    storage: Arc<SeaOrmStorage>,
}

impl CatalogService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn list_content(
        &self,
        filter: &ContentFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<ContentPage> {
        let (page, page_size) = clamp_paging(page, page_size);
        let (items, total) = self
            .storage
            .list_contents(filter, page, page_size)
            .await?;

        Ok(ContentPage {
            items,
            pagination: Pagination {
                page,
                page_size,
                total,
                total_pages: total.div_ceil(page_size),
            },
        })
    }

    pub async fn get_content_detail(&self, id: i32) -> Result<ContentDetail> {
        let content = self
            .storage
            .get_content(id)
            .await?
            .ok_or_else(|| MflixError::not_found(format!("Content {} not found", id)))?;

        let trailer = self.storage.get_trailer(id).await?;
        let episodes = self.storage.list_episodes(id).await?;
        let links = self.storage.get_download_links(id).await?;

        let (content_links, mut episode_links): (Vec<_>, Vec<_>) =
            links.into_iter().partition(|l| l.episode_id.is_none());

        let episodes = episodes
            .into_iter()
            .map(|episode| {
                let (mine, rest): (Vec<_>, Vec<_>) = episode_links
                    .drain(..)
                    .partition(|l| l.episode_id == Some(episode.id));
                episode_links = rest;
                EpisodeDetail {
                    episode,
                    downloads: group_by_quality(mine),
                }
            })
            .collect();

        Ok(ContentDetail {
            content,
            trailer,
            episodes,
            downloads: group_by_quality(content_links),
        })
    }

    /// Title, description, genre and country matches, merged in that order
    pub async fn search(&self, query: &str, limit: Option<u64>) -> Vec<Content> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_PAGE_SIZE);

        let mut lists = Vec::with_capacity(SearchField::ALL.len());
        for field in SearchField::ALL {
            match self.storage.search_contents(field, query, limit).await {
                Ok(found) => lists.push(found),
                Err(e) => warn!("Search on {:?} failed for '{}': {}", field, query, e),
            }
        }
        merge_unique(lists, limit as usize)
    }

    pub async fn list_ads(&self, position: &str) -> Vec<Ad> {
        match self.storage.active_ads(position).await {
            Ok(ads) => ads,
            Err(e) => {
                warn!("Ad lookup failed for '{}': {}", position, e);
                Vec::new()
            }
        }
    }

    pub async fn list_genres(&self) -> Result<Vec<Genre>> {
        self.storage.list_genres().await
    }

    pub async fn list_countries(&self) -> Result<Vec<Country>> {
        self.storage.list_countries().await
    }

    pub async fn get_setting(&self, key: &str) -> Result<serde_json::Value> {
        self.storage
            .get_setting(key)
            .await?
            .ok_or_else(|| MflixError::not_found(format!("Setting '{}' not found", key)))
    }

    /// The gate only looks at links of one content (or one of its episodes)
    pub async fn gate_links(
        &self,
        content_id: i32,
        episode_id: Option<i32>,
    ) -> Result<Vec<DownloadLink>> {
        if self.storage.get_content(content_id).await?.is_none() {
            return Err(MflixError::not_found(format!(
                "Content {} not found",
                content_id
            )));
        }
        let links = self.storage.get_download_links(content_id).await?;
        Ok(links
            .into_iter()
            .filter(|l| l.episode_id == episode_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ContentType, SourceType};
    use chrono::Utc;

    fn link(id: i32, quality: &str) -> DownloadLink {
        DownloadLink {
            id,
            content_id: 1,
            episode_id: None,
            quality: quality.to_string(),
            file_size: None,
            source_type: SourceType::Direct,
            url: format!("https://cdn.example.com/{}", id),
            created_at: Utc::now(),
            mirrors: Vec::new(),
        }
    }

    fn content(id: i32) -> Content {
        Content {
            id,
            title: format!("c{}", id),
            description: None,
            content_type: ContentType::Movie,
            release_year: None,
            rating: None,
            genre: None,
            country: None,
            poster_url: None,
            backdrop_url: None,
            duration_minutes: None,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_quality_rank() {
        let groups = group_by_quality(vec![
            link(1, "720p"),
            link(2, "CAM"),
            link(3, "4K"),
            link(4, "1080p"),
            link(5, "720p"),
            link(6, "BluRay"),
            link(7, "360p"),
        ]);
        let order: Vec<&str> = groups.iter().map(|g| g.quality.as_str()).collect();
        assert_eq!(order, vec!["4K", "1080p", "720p", "360p", "BluRay", "CAM"]);
        let ids: Vec<i32> = groups[2].links.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn test_merge_unique_keeps_first_occurrence() {
        let merged = merge_unique(
            vec![
                vec![content(3), content(1)],
                vec![content(1), content(2)],
                vec![],
                vec![content(2), content(4)],
            ],
            10,
        );
        let ids: Vec<i32> = merged.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);

        let limited = merge_unique(vec![vec![content(1), content(2), content(3)]], 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_clamp_paging() {
        assert_eq!(clamp_paging(None, None), (1, 20));
        assert_eq!(clamp_paging(Some(0), Some(0)), (1, 1));
        assert_eq!(clamp_paging(Some(3), Some(500)), (3, 100));
    }
}
