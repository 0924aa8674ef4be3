//! Mutation operations for SeaOrmStorage
//!
//! Multi-row writes (content + links + mirrors + trailer, episode + links,
//! cascading deletes) run inside one transaction each.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QuerySelect, TransactionTrait, sea_query::OnConflict,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{
    ad_to_active_model, content_to_active_model, download_link_to_active_model,
    episode_to_active_model, mirror_to_active_model, model_to_ad, model_to_content,
    model_to_country, model_to_episode, model_to_genre, trailer_to_active_model,
};
use crate::errors::{MflixError, Result};
use crate::storage::models::{
    Ad, Content, Country, Episode, Genre, NewAd, NewContent, NewDownloadLink, NewEpisode,
    NewTrailer,
};

use migration::entities::{
    ad, content, country, download_link, download_mirror, episode, genre, site_setting, trailer,
};

fn db_error(op: &str, e: DbErr) -> MflixError {
    MflixError::database_operation(format!("{}失败: {}", op, e))
}

/// Insert links and their mirrors on an open connection or transaction
async fn insert_links<C: ConnectionTrait>(
    conn: &C,
    content_id: i32,
    episode_id: Option<i32>,
    links: &[NewDownloadLink],
    now: DateTime<Utc>,
) -> std::result::Result<(), DbErr> {
    for link in links {
        let inserted = download_link_to_active_model(link, content_id, episode_id, now)
            .insert(conn)
            .await?;
        for mirror in &link.mirrors {
            mirror_to_active_model(mirror, inserted.id)
                .insert(conn)
                .await?;
        }
    }
    Ok(())
}

/// Delete the given links and their mirrors
async fn delete_links<C: ConnectionTrait>(
    conn: &C,
    link_ids: Vec<i32>,
) -> std::result::Result<(), DbErr> {
    if link_ids.is_empty() {
        return Ok(());
    }
    download_mirror::Entity::delete_many()
        .filter(download_mirror::Column::DownloadLinkId.is_in(link_ids.clone()))
        .exec(conn)
        .await?;
    download_link::Entity::delete_many()
        .filter(download_link::Column::Id.is_in(link_ids))
        .exec(conn)
        .await?;
    Ok(())
}

async fn link_ids_where<C: ConnectionTrait>(
    conn: &C,
    condition: sea_orm::Condition,
) -> std::result::Result<Vec<i32>, DbErr> {
    download_link::Entity::find()
        .select_only()
        .column(download_link::Column::Id)
        .filter(condition)
        .into_tuple::<i32>()
        .all(conn)
        .await
}

impl SeaOrmStorage {
    /// 创建内容（含下载链接、镜像、预告片），单个事务
    pub async fn create_content(
        &self,
        new: &NewContent,
        links: &[NewDownloadLink],
        trailer: Option<&NewTrailer>,
    ) -> Result<Content> {
        let now = Utc::now();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("开始事务", e))?;

        let model = content_to_active_model(new, now, true)
            .insert(&txn)
            .await
            .map_err(|e| db_error("插入内容", e))?;

        insert_links(&txn, model.id, None, links, now)
            .await
            .map_err(|e| db_error("插入下载链接", e))?;

        if let Some(trailer) = trailer {
            trailer_to_active_model(trailer, model.id)
                .insert(&txn)
                .await
                .map_err(|e| db_error("插入预告片", e))?;
        }

        txn.commit().await.map_err(|e| db_error("提交事务", e))?;

        self.invalidate_count_cache();
        info!(
            "Content created: id={}, title={}, links={}",
            model.id,
            model.title,
            links.len()
        );
        Ok(model_to_content(model))
    }

    /// 更新内容
    ///
    /// `links`: replaces the content-level links when given.
    /// `trailer`: `Some(None)` removes the trailer, `Some(Some(_))` replaces it.
    pub async fn update_content(
        &self,
        id: i32,
        new: &NewContent,
        links: Option<&[NewDownloadLink]>,
        trailer: Option<Option<&NewTrailer>>,
    ) -> Result<Content> {
        let now = Utc::now();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("开始事务", e))?;

        if content::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| db_error("查询内容", e))?
            .is_none()
        {
            return Err(MflixError::not_found(format!("内容不存在: {}", id)));
        }

        let mut active = content_to_active_model(new, now, false);
        active.id = Set(id);
        let model = active
            .update(&txn)
            .await
            .map_err(|e| db_error("更新内容", e))?;

        if let Some(links) = links {
            let existing = link_ids_where(
                &txn,
                sea_orm::Condition::all()
                    .add(download_link::Column::ContentId.eq(id))
                    .add(download_link::Column::EpisodeId.is_null()),
            )
            .await
            .map_err(|e| db_error("查询下载链接", e))?;
            delete_links(&txn, existing)
                .await
                .map_err(|e| db_error("删除下载链接", e))?;
            insert_links(&txn, id, None, links, now)
                .await
                .map_err(|e| db_error("插入下载链接", e))?;
        }

        if let Some(trailer) = trailer {
            trailer::Entity::delete_many()
                .filter(trailer::Column::ContentId.eq(id))
                .exec(&txn)
                .await
                .map_err(|e| db_error("删除预告片", e))?;
            if let Some(trailer) = trailer {
                trailer_to_active_model(trailer, id)
                    .insert(&txn)
                    .await
                    .map_err(|e| db_error("插入预告片", e))?;
            }
        }

        txn.commit().await.map_err(|e| db_error("提交事务", e))?;

        self.invalidate_count_cache();
        info!("Content updated: id={}", id);
        Ok(model_to_content(model))
    }

    /// 删除内容及其下载链接、镜像、剧集、预告片
    pub async fn delete_content(&self, id: i32) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("开始事务", e))?;

        let link_ids = link_ids_where(
            &txn,
            sea_orm::Condition::all().add(download_link::Column::ContentId.eq(id)),
        )
        .await
        .map_err(|e| db_error("查询下载链接", e))?;
        delete_links(&txn, link_ids)
            .await
            .map_err(|e| db_error("删除下载链接", e))?;

        episode::Entity::delete_many()
            .filter(episode::Column::ContentId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| db_error("删除剧集", e))?;
        trailer::Entity::delete_many()
            .filter(trailer::Column::ContentId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| db_error("删除预告片", e))?;

        let result = content::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| db_error("删除内容", e))?;

        if result.rows_affected == 0 {
            // dropping the transaction rolls back
            return Err(MflixError::not_found(format!("内容不存在: {}", id)));
        }

        txn.commit().await.map_err(|e| db_error("提交事务", e))?;

        self.invalidate_count_cache();
        info!("Content deleted: id={}", id);
        Ok(())
    }

    /// 创建剧集及其下载链接，单个事务
    pub async fn create_episode(
        &self,
        content_id: i32,
        new: &NewEpisode,
        links: &[NewDownloadLink],
    ) -> Result<Episode> {
        let now = Utc::now();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("开始事务", e))?;

        if content::Entity::find_by_id(content_id)
            .one(&txn)
            .await
            .map_err(|e| db_error("查询内容", e))?
            .is_none()
        {
            return Err(MflixError::not_found(format!("内容不存在: {}", content_id)));
        }

        let model = episode_to_active_model(new, content_id, now)
            .insert(&txn)
            .await
            .map_err(|e| db_error("插入剧集", e))?;

        insert_links(&txn, content_id, Some(model.id), links, now)
            .await
            .map_err(|e| db_error("插入下载链接", e))?;

        txn.commit().await.map_err(|e| db_error("提交事务", e))?;

        info!(
            "Episode created: content={}, S{}E{}",
            content_id, model.season_number, model.episode_number
        );
        Ok(model_to_episode(model))
    }

    pub async fn delete_episode(&self, id: i32) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("开始事务", e))?;

        let link_ids = link_ids_where(
            &txn,
            sea_orm::Condition::all().add(download_link::Column::EpisodeId.eq(id)),
        )
        .await
        .map_err(|e| db_error("查询下载链接", e))?;
        delete_links(&txn, link_ids)
            .await
            .map_err(|e| db_error("删除下载链接", e))?;

        let result = episode::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| db_error("删除剧集", e))?;
        if result.rows_affected == 0 {
            return Err(MflixError::not_found(format!("剧集不存在: {}", id)));
        }

        txn.commit().await.map_err(|e| db_error("提交事务", e))?;
        info!("Episode deleted: id={}", id);
        Ok(())
    }

    pub async fn create_ad(&self, new: &NewAd) -> Result<Ad> {
        let model = ad_to_active_model(new, Utc::now(), true)
            .insert(&self.db)
            .await
            .map_err(|e| db_error("插入广告", e))?;
        info!("Ad created: id={}, position={}", model.id, model.position);
        Ok(model_to_ad(model))
    }

    pub async fn update_ad(&self, id: i32, new: &NewAd) -> Result<Ad> {
        if ad::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("查询广告", e))?
            .is_none()
        {
            return Err(MflixError::not_found(format!("广告不存在: {}", id)));
        }

        let mut active = ad_to_active_model(new, Utc::now(), false);
        active.id = Set(id);
        let model = active
            .update(&self.db)
            .await
            .map_err(|e| db_error("更新广告", e))?;
        Ok(model_to_ad(model))
    }

    pub async fn delete_ad(&self, id: i32) -> Result<()> {
        let result = ad::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("删除广告", e))?;
        if result.rows_affected == 0 {
            return Err(MflixError::not_found(format!("广告不存在: {}", id)));
        }
        info!("Ad deleted: id={}", id);
        Ok(())
    }

    pub async fn create_genre(&self, name: &str) -> Result<Genre> {
        let name = name.trim();
        let exists = genre::Entity::find()
            .filter(genre::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| db_error("查询类型", e))?;
        if exists.is_some() {
            return Err(MflixError::conflict(format!("类型已存在: {}", name)));
        }

        let model = genre::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| db_error("插入类型", e))?;
        Ok(model_to_genre(model))
    }

    pub async fn delete_genre(&self, id: i32) -> Result<()> {
        let result = genre::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("删除类型", e))?;
        if result.rows_affected == 0 {
            return Err(MflixError::not_found(format!("类型不存在: {}", id)));
        }
        Ok(())
    }

    pub async fn create_country(&self, name: &str, code: Option<&str>) -> Result<Country> {
        let name = name.trim();
        let exists = country::Entity::find()
            .filter(country::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| db_error("查询国家", e))?;
        if exists.is_some() {
            return Err(MflixError::conflict(format!("国家已存在: {}", name)));
        }

        let model = country::ActiveModel {
            name: Set(name.to_string()),
            code: Set(code.map(|c| c.trim().to_string())),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| db_error("插入国家", e))?;
        Ok(model_to_country(model))
    }

    pub async fn delete_country(&self, id: i32) -> Result<()> {
        let result = country::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("删除国家", e))?;
        if result.rows_affected == 0 {
            return Err(MflixError::not_found(format!("国家不存在: {}", id)));
        }
        Ok(())
    }

    /// 写入站点设置（upsert）
    pub async fn put_setting(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let model = site_setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(serde_json::to_string(value)?),
            updated_at: Set(Utc::now()),
        };

        site_setting::Entity::insert(model)
            .on_conflict(
                OnConflict::column(site_setting::Column::Key)
                    .update_columns([site_setting::Column::Value, site_setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| db_error("写入站点设置", e))?;

        info!("Site setting updated: {}", key);
        Ok(())
    }
}
