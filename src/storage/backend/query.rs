//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::debug;

use super::converters::{
    model_to_ad, model_to_content, model_to_country, model_to_download_link, model_to_episode,
    model_to_genre, model_to_mirror, model_to_redirect_link, model_to_trailer,
};
use super::{SeaOrmStorage, retry};
use crate::errors::{MflixError, Result};
use crate::storage::models::{
    Ad, AdType, CatalogStats, Content, ContentFilter, ContentType, Country, DownloadLink,
    Episode, Genre, RedirectLink, Trailer,
};

use migration::entities::{
    ad, content, country, download_link, download_mirror, episode, genre, site_setting, trailer,
};

/// Columns searched independently by the catalog search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Description,
    Genre,
    Country,
}

impl SearchField {
    /// Merge priority of search results
    pub const ALL: [SearchField; 4] = [
        SearchField::Title,
        SearchField::Description,
        SearchField::Genre,
        SearchField::Country,
    ];

    fn column(self) -> content::Column {
        match self {
            SearchField::Title => content::Column::Title,
            SearchField::Description => content::Column::Description,
            SearchField::Genre => content::Column::Genre,
            SearchField::Country => content::Column::Country,
        }
    }
}

fn db_error(op: &str, e: sea_orm::DbErr) -> MflixError {
    MflixError::database_operation(format!("{}失败: {}", op, e))
}

fn content_condition(filter: &ContentFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(content_type) = filter.content_type {
        condition = condition.add(content::Column::ContentType.eq(content_type.as_ref()));
    }
    if let Some(ref genre) = filter.genre
        && !genre.trim().is_empty()
    {
        condition = condition.add(content::Column::Genre.contains(genre.trim()));
    }
    if let Some(ref country) = filter.country
        && !country.trim().is_empty()
    {
        condition = condition.add(content::Column::Country.eq(country.trim()));
    }
    if let Some(featured) = filter.featured {
        condition = condition.add(content::Column::IsFeatured.eq(featured));
    }

    condition
}

impl SeaOrmStorage {
    /// 带过滤条件的分页加载内容（带 COUNT 缓存），最新的在前
    pub async fn list_contents(
        &self,
        filter: &ContentFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Content>, u64)> {
        let cache_key = format!(
            "contents:t={:?}:g={:?}:c={:?}:f={:?}",
            filter.content_type, filter.genre, filter.country, filter.featured
        );
        let condition = content_condition(filter);
        let db = &self.db;

        let total = if let Some(cached) = self.count_cache.get(&cache_key) {
            debug!("count cache hit: key={}, value={}", cache_key, cached);
            cached
        } else {
            let cond = condition.clone();
            let count = retry::with_retry("list_contents(count)", self.retry_config, || async {
                content::Entity::find().filter(cond.clone()).count(db).await
            })
            .await
            .map_err(|e| db_error("统计内容数量", e))?;
            self.count_cache.insert(cache_key, count);
            count
        };

        let page_offset = page.saturating_sub(1);
        let models = retry::with_retry("list_contents(data)", self.retry_config, || async {
            content::Entity::find()
                .filter(condition.clone())
                .order_by_desc(content::Column::CreatedAt)
                .order_by_desc(content::Column::Id)
                .paginate(db, page_size)
                .fetch_page(page_offset)
                .await
        })
        .await
        .map_err(|e| db_error("分页查询内容", e))?;

        Ok((models.into_iter().map(model_to_content).collect(), total))
    }

    pub async fn get_content(&self, id: i32) -> Result<Option<Content>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_content({})", id), self.retry_config, || async {
            content::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| db_error("查询内容", e))?;

        Ok(model.map(model_to_content))
    }

    /// All download links of a content (episode links included), mirrors attached
    pub async fn get_download_links(&self, content_id: i32) -> Result<Vec<DownloadLink>> {
        let models = download_link::Entity::find()
            .filter(download_link::Column::ContentId.eq(content_id))
            .order_by_asc(download_link::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| db_error("查询下载链接", e))?;

        let mut links: Vec<DownloadLink> = models.into_iter().map(model_to_download_link).collect();
        self.attach_mirrors(&mut links).await?;
        Ok(links)
    }

    pub async fn get_download_link(&self, id: i32) -> Result<Option<DownloadLink>> {
        let Some(model) = download_link::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("查询下载链接", e))?
        else {
            return Ok(None);
        };

        let mut links = vec![model_to_download_link(model)];
        self.attach_mirrors(&mut links).await?;
        Ok(links.pop())
    }

    async fn attach_mirrors(&self, links: &mut [DownloadLink]) -> Result<()> {
        if links.is_empty() {
            return Ok(());
        }

        let ids: Vec<i32> = links.iter().map(|l| l.id).collect();
        let mirrors = download_mirror::Entity::find()
            .filter(download_mirror::Column::DownloadLinkId.is_in(ids))
            .order_by_asc(download_mirror::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| db_error("查询镜像", e))?;

        let mut by_link: HashMap<i32, Vec<_>> = HashMap::new();
        for mirror in mirrors {
            by_link
                .entry(mirror.download_link_id)
                .or_default()
                .push(model_to_mirror(mirror));
        }
        for link in links.iter_mut() {
            link.mirrors = by_link.remove(&link.id).unwrap_or_default();
        }
        Ok(())
    }

    pub async fn list_episodes(&self, content_id: i32) -> Result<Vec<Episode>> {
        let models = episode::Entity::find()
            .filter(episode::Column::ContentId.eq(content_id))
            .order_by_asc(episode::Column::SeasonNumber)
            .order_by_asc(episode::Column::EpisodeNumber)
            .all(&self.db)
            .await
            .map_err(|e| db_error("查询剧集", e))?;

        Ok(models.into_iter().map(model_to_episode).collect())
    }

    pub async fn get_trailer(&self, content_id: i32) -> Result<Option<Trailer>> {
        let model = trailer::Entity::find()
            .filter(trailer::Column::ContentId.eq(content_id))
            .order_by_asc(trailer::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("查询预告片", e))?;

        Ok(model.map(model_to_trailer))
    }

    /// Substring match on one column, newest first
    pub async fn search_contents(
        &self,
        field: SearchField,
        query: &str,
        limit: u64,
    ) -> Result<Vec<Content>> {
        let db = &self.db;
        let models = retry::with_retry(
            &format!("search_contents({:?})", field),
            self.retry_config,
            || async {
                content::Entity::find()
                    .filter(field.column().contains(query))
                    .order_by_desc(content::Column::CreatedAt)
                    .limit(limit)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| db_error("搜索内容", e))?;

        Ok(models.into_iter().map(model_to_content).collect())
    }

    /// Active redirect links of a position, ordered by display_order
    pub async fn active_redirect_links(&self, position: &str) -> Result<Vec<RedirectLink>> {
        let db = &self.db;
        let models = retry::with_retry(
            &format!("active_redirect_links({})", position),
            self.retry_config,
            || async {
                ad::Entity::find()
                    .filter(ad::Column::AdType.eq(AdType::RedirectLink.as_ref()))
                    .filter(ad::Column::Position.eq(position))
                    .filter(ad::Column::IsActive.eq(true))
                    .order_by_asc(ad::Column::DisplayOrder)
                    .order_by_asc(ad::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| db_error("查询跳转链接", e))?;

        Ok(models.into_iter().filter_map(model_to_redirect_link).collect())
    }

    /// Active display ads (everything except redirect links) of a position
    pub async fn active_ads(&self, position: &str) -> Result<Vec<Ad>> {
        let db = &self.db;
        let models = retry::with_retry(
            &format!("active_ads({})", position),
            self.retry_config,
            || async {
                ad::Entity::find()
                    .filter(ad::Column::AdType.ne(AdType::RedirectLink.as_ref()))
                    .filter(ad::Column::Position.eq(position))
                    .filter(ad::Column::IsActive.eq(true))
                    .order_by_asc(ad::Column::DisplayOrder)
                    .order_by_asc(ad::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| db_error("查询广告", e))?;

        Ok(models.into_iter().map(model_to_ad).collect())
    }

    pub async fn list_all_ads(&self) -> Result<Vec<Ad>> {
        let models = ad::Entity::find()
            .order_by_asc(ad::Column::Position)
            .order_by_asc(ad::Column::DisplayOrder)
            .order_by_asc(ad::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| db_error("查询广告列表", e))?;

        Ok(models.into_iter().map(model_to_ad).collect())
    }

    pub async fn get_ad(&self, id: i32) -> Result<Option<Ad>> {
        let model = ad::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("查询广告", e))?;
        Ok(model.map(model_to_ad))
    }

    /// Number of active redirect links at `position`, optionally ignoring one ad
    pub async fn count_active_redirect_links(
        &self,
        position: &str,
        exclude_id: Option<i32>,
    ) -> Result<u64> {
        let mut query = ad::Entity::find()
            .filter(ad::Column::AdType.eq(AdType::RedirectLink.as_ref()))
            .filter(ad::Column::Position.eq(position))
            .filter(ad::Column::IsActive.eq(true));
        if let Some(id) = exclude_id {
            query = query.filter(ad::Column::Id.ne(id));
        }

        query
            .count(&self.db)
            .await
            .map_err(|e| db_error("统计跳转链接", e))
    }

    pub async fn list_genres(&self) -> Result<Vec<Genre>> {
        let models = genre::Entity::find()
            .order_by_asc(genre::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| db_error("查询类型", e))?;
        Ok(models.into_iter().map(model_to_genre).collect())
    }

    pub async fn list_countries(&self) -> Result<Vec<Country>> {
        let models = country::Entity::find()
            .order_by_asc(country::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| db_error("查询国家", e))?;
        Ok(models.into_iter().map(model_to_country).collect())
    }

    /// 读取站点设置（JSON）
    pub async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let model = site_setting::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(|e| db_error("查询站点设置", e))?;

        match model {
            Some(m) => Ok(Some(serde_json::from_str(&m.value)?)),
            None => Ok(None),
        }
    }

    /// Raw row counts for the admin dashboard
    pub async fn get_stats(&self) -> Result<CatalogStats> {
        let db = &self.db;
        let count_type = |t: ContentType| async move {
            content::Entity::find()
                .filter(content::Column::ContentType.eq(t.as_ref()))
                .count(db)
                .await
        };

        let stats = async {
            Ok::<_, sea_orm::DbErr>(CatalogStats {
                movies: count_type(ContentType::Movie).await?,
                series: count_type(ContentType::Series).await?,
                anime: count_type(ContentType::Anime).await?,
                episodes: episode::Entity::find().count(db).await?,
                download_links: download_link::Entity::find().count(db).await?,
                ads_total: ad::Entity::find().count(db).await?,
                ads_active: ad::Entity::find()
                    .filter(ad::Column::IsActive.eq(true))
                    .count(db)
                    .await?,
                redirect_links: ad::Entity::find()
                    .filter(ad::Column::AdType.eq(AdType::RedirectLink.as_ref()))
                    .count(db)
                    .await?,
            })
        }
        .await
        .map_err(|e| db_error("统计查询", e))?;

        Ok(stats)
    }
}
