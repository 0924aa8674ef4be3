use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use tracing::warn;

use crate::storage::models::{
    Ad, AdType, Content, ContentType, Country, DownloadLink, DownloadMirror, Episode, Genre,
    NewAd, NewContent, NewDownloadLink, NewEpisode, NewMirror, NewTrailer, RedirectLink,
    SourceType, Trailer,
};
use migration::entities::{
    ad, content, country, download_link, download_mirror, episode, genre, trailer,
};

/// 解析存储的枚举字符串，未知值回退到默认值
fn parse_or_default<T: FromStr + Default>(raw: &str, column: &str) -> T {
    T::from_str(raw).unwrap_or_else(|_| {
        warn!("Unknown {} value in database: '{}'", column, raw);
        T::default()
    })
}

pub fn model_to_content(model: content::Model) -> Content {
    Content {
        id: model.id,
        title: model.title,
        description: model.description,
        content_type: parse_or_default::<ContentType>(&model.content_type, "content_type"),
        release_year: model.release_year,
        rating: model.rating,
        genre: model.genre,
        country: model.country,
        poster_url: model.poster_url,
        backdrop_url: model.backdrop_url,
        duration_minutes: model.duration_minutes,
        is_featured: model.is_featured,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Mirrors are attached separately by the query layer
pub fn model_to_download_link(model: download_link::Model) -> DownloadLink {
    DownloadLink {
        id: model.id,
        content_id: model.content_id,
        episode_id: model.episode_id,
        quality: model.quality,
        file_size: model.file_size,
        source_type: parse_or_default::<SourceType>(&model.source_type, "source_type"),
        url: model.url,
        created_at: model.created_at,
        mirrors: Vec::new(),
    }
}

pub fn model_to_mirror(model: download_mirror::Model) -> DownloadMirror {
    DownloadMirror {
        id: model.id,
        download_link_id: model.download_link_id,
        name: model.name,
        url: model.url,
    }
}

pub fn model_to_episode(model: episode::Model) -> Episode {
    Episode {
        id: model.id,
        content_id: model.content_id,
        season_number: model.season_number,
        episode_number: model.episode_number,
        title: model.title,
        created_at: model.created_at,
    }
}

pub fn model_to_trailer(model: trailer::Model) -> Trailer {
    Trailer {
        id: model.id,
        content_id: model.content_id,
        title: model.title,
        url: model.url,
    }
}

pub fn model_to_ad(model: ad::Model) -> Ad {
    Ad {
        id: model.id,
        name: model.name,
        ad_type: parse_or_default::<AdType>(&model.ad_type, "ad_type"),
        position: model.position,
        image_url: model.image_url,
        html_code: model.html_code,
        redirect_url: model.redirect_url,
        is_active: model.is_active,
        display_order: model.display_order,
        created_at: model.created_at,
    }
}

/// Rows without a redirect URL cannot be followed and are skipped
pub fn model_to_redirect_link(model: ad::Model) -> Option<RedirectLink> {
    let redirect_url = model.redirect_url.filter(|u| !u.trim().is_empty())?;
    Some(RedirectLink {
        id: model.id,
        position: model.position,
        redirect_url,
        is_active: model.is_active,
        display_order: model.display_order,
    })
}

pub fn model_to_genre(model: genre::Model) -> Genre {
    Genre {
        id: model.id,
        name: model.name,
    }
}

pub fn model_to_country(model: country::Model) -> Country {
    Country {
        id: model.id,
        name: model.name,
        code: model.code,
    }
}

/// 将 NewContent 转换为 ActiveModel
///
/// `created_at` is only set for inserts.
pub fn content_to_active_model(
    new: &NewContent,
    now: DateTime<Utc>,
    is_new: bool,
) -> content::ActiveModel {
    content::ActiveModel {
        id: NotSet,
        title: Set(new.title.trim().to_string()),
        description: Set(new.description.clone()),
        content_type: Set(new.content_type.as_ref().to_string()),
        release_year: Set(new.release_year),
        rating: Set(new.rating),
        genre: Set(new.genre.clone()),
        country: Set(new.country.clone()),
        poster_url: Set(new.poster_url.clone()),
        backdrop_url: Set(new.backdrop_url.clone()),
        duration_minutes: Set(new.duration_minutes),
        is_featured: Set(new.is_featured),
        created_at: if is_new { Set(now) } else { NotSet },
        updated_at: Set(now),
    }
}

pub fn download_link_to_active_model(
    new: &NewDownloadLink,
    content_id: i32,
    episode_id: Option<i32>,
    now: DateTime<Utc>,
) -> download_link::ActiveModel {
    download_link::ActiveModel {
        id: NotSet,
        content_id: Set(content_id),
        episode_id: Set(episode_id),
        quality: Set(new.quality.trim().to_string()),
        file_size: Set(new.file_size.clone()),
        source_type: Set(new.source_type.as_ref().to_string()),
        url: Set(new.url.trim().to_string()),
        created_at: Set(now),
    }
}

pub fn mirror_to_active_model(new: &NewMirror, download_link_id: i32) -> download_mirror::ActiveModel {
    download_mirror::ActiveModel {
        id: NotSet,
        download_link_id: Set(download_link_id),
        name: Set(new.name.clone()),
        url: Set(new.url.trim().to_string()),
    }
}

pub fn trailer_to_active_model(new: &NewTrailer, content_id: i32) -> trailer::ActiveModel {
    trailer::ActiveModel {
        id: NotSet,
        content_id: Set(content_id),
        title: Set(new.title.clone()),
        url: Set(new.url.trim().to_string()),
    }
}

pub fn episode_to_active_model(
    new: &NewEpisode,
    content_id: i32,
    now: DateTime<Utc>,
) -> episode::ActiveModel {
    episode::ActiveModel {
        id: NotSet,
        content_id: Set(content_id),
        season_number: Set(new.season_number),
        episode_number: Set(new.episode_number),
        title: Set(new.title.clone()),
        created_at: Set(now),
    }
}

pub fn ad_to_active_model(new: &NewAd, now: DateTime<Utc>, is_new: bool) -> ad::ActiveModel {
    ad::ActiveModel {
        id: NotSet,
        name: Set(new.name.clone()),
        ad_type: Set(new.ad_type.as_ref().to_string()),
        position: Set(new.position.trim().to_string()),
        image_url: Set(new.image_url.clone()),
        html_code: Set(new.html_code.clone()),
        redirect_url: Set(new.redirect_url.clone()),
        is_active: Set(new.is_active),
        display_order: Set(new.display_order),
        created_at: if is_new { Set(now) } else { NotSet },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    fn ad_model(ad_type: &str, redirect_url: Option<&str>) -> ad::Model {
        ad::Model {
            id: 3,
            name: "pop".to_string(),
            ad_type: ad_type.to_string(),
            position: "download_cta_1".to_string(),
            image_url: None,
            html_code: None,
            redirect_url: redirect_url.map(str::to_string),
            is_active: true,
            display_order: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_model_to_content_unknown_type_falls_back() {
        let now = Utc::now();
        let model = content::Model {
            id: 1,
            title: "Dune".to_string(),
            description: None,
            content_type: "documentary".to_string(),
            release_year: Some(2021),
            rating: Some(8.1),
            genre: Some("Sci-Fi".to_string()),
            country: None,
            poster_url: None,
            backdrop_url: None,
            duration_minutes: Some(155),
            is_featured: false,
            created_at: now,
            updated_at: now,
        };
        let content = model_to_content(model);
        assert_eq!(content.content_type, ContentType::Movie);
        assert_eq!(content.release_year, Some(2021));
    }

    #[test]
    fn test_model_to_redirect_link() {
        let link = model_to_redirect_link(ad_model("redirect_link", Some("https://ad.example")))
            .unwrap();
        assert_eq!(link.redirect_url, "https://ad.example");
        assert_eq!(link.display_order, 2);

        assert!(model_to_redirect_link(ad_model("redirect_link", None)).is_none());
        assert!(model_to_redirect_link(ad_model("redirect_link", Some("  "))).is_none());
    }

    #[test]
    fn test_model_to_ad_parses_type() {
        let ad = model_to_ad(ad_model("popup", None));
        assert_eq!(ad.ad_type, AdType::Popup);
    }

    #[test]
    fn test_content_to_active_model_update_keeps_created_at() {
        let new = NewContent {
            title: "  Arrival ".to_string(),
            description: None,
            content_type: ContentType::Series,
            release_year: None,
            rating: None,
            genre: None,
            country: None,
            poster_url: None,
            backdrop_url: None,
            duration_minutes: None,
            is_featured: true,
        };
        let now = Utc::now();

        let insert = content_to_active_model(&new, now, true);
        assert!(matches!(insert.title, ActiveValue::Set(ref t) if t == "Arrival"));
        assert!(matches!(insert.content_type, ActiveValue::Set(ref t) if t == "series"));
        assert!(matches!(insert.created_at, ActiveValue::Set(t) if t == now));

        let update = content_to_active_model(&new, now, false);
        assert!(matches!(update.created_at, ActiveValue::NotSet));
    }

    #[test]
    fn test_download_link_to_active_model() {
        let new = NewDownloadLink {
            quality: " 1080p ".to_string(),
            file_size: Some("2.1 GB".to_string()),
            source_type: SourceType::Free,
            url: "https://dl.example/file".to_string(),
            mirrors: vec![],
        };
        let model = download_link_to_active_model(&new, 9, Some(4), Utc::now());
        assert!(matches!(model.content_id, ActiveValue::Set(9)));
        assert!(matches!(model.episode_id, ActiveValue::Set(Some(4))));
        assert!(matches!(model.quality, ActiveValue::Set(ref q) if q == "1080p"));
        assert!(matches!(model.source_type, ActiveValue::Set(ref s) if s == "free"));
    }
}
