//! Admin API 类型定义

use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::{ContentFilter, ContentType, NewContent, NewDownloadLink, NewEpisode, NewTrailer};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoginCredentials {
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuthSuccessResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// Content list query (`?page=&page_size=&content_type=&genre=&country=&featured=`)
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ContentListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub content_type: Option<ContentType>,
    pub genre: Option<String>,
    pub country: Option<String>,
    pub featured: Option<bool>,
}

impl ContentListQuery {
    pub fn filter(&self) -> ContentFilter {
        ContentFilter {
            content_type: self.content_type,
            genre: self.genre.clone(),
            country: self.country.clone(),
            featured: self.featured,
        }
    }
}

/// Create request: the content plus its downloads and trailer, written together
#[derive(Deserialize, Clone, Debug)]
pub struct CreateContentRequest {
    #[serde(flatten)]
    pub content: NewContent,
    #[serde(default)]
    pub download_links: Vec<NewDownloadLink>,
    #[serde(default)]
    pub trailer: Option<NewTrailer>,
}

/// Distinguishes an absent field from an explicit `null`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Update request
///
/// `download_links` absent keeps the links, present replaces them.
/// `trailer` absent keeps it, `null` removes it, an object replaces it.
#[derive(Deserialize, Clone, Debug)]
pub struct UpdateContentRequest {
    #[serde(flatten)]
    pub content: NewContent,
    #[serde(default)]
    pub download_links: Option<Vec<NewDownloadLink>>,
    #[serde(default, deserialize_with = "double_option")]
    pub trailer: Option<Option<NewTrailer>>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CreateEpisodeRequest {
    #[serde(flatten)]
    pub episode: NewEpisode,
    #[serde(default)]
    pub download_links: Vec<NewDownloadLink>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GenreRequest {
    pub name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CountryRequest {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DeleteResponse {
    pub id: i32,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_flattens_content() {
        let req: CreateContentRequest = serde_json::from_value(serde_json::json!({
            "title": "Inception",
            "content_type": "movie",
            "rating": 8.8,
            "download_links": [
                {"quality": "1080p", "url": "https://cdn.example.com/i.mkv",
                 "mirrors": [{"name": "M1", "url": "https://m.example.com/i.mkv"}]}
            ],
            "trailer": {"url": "https://video.example.com/t"}
        }))
        .unwrap();

        assert_eq!(req.content.title, "Inception");
        assert_eq!(req.content.rating, Some(8.8));
        assert_eq!(req.download_links[0].mirrors.len(), 1);
        assert!(req.trailer.is_some());
    }

    #[test]
    fn test_update_trailer_tristate() {
        let keep: UpdateContentRequest =
            serde_json::from_str(r#"{"title":"A","content_type":"anime"}"#).unwrap();
        assert!(keep.trailer.is_none());
        assert!(keep.download_links.is_none());

        let remove: UpdateContentRequest =
            serde_json::from_str(r#"{"title":"A","content_type":"anime","trailer":null}"#)
                .unwrap();
        assert!(matches!(remove.trailer, Some(None)));

        let replace: UpdateContentRequest = serde_json::from_str(
            r#"{"title":"A","content_type":"anime","trailer":{"url":"https://x.example.com"},"download_links":[]}"#,
        )
        .unwrap();
        assert!(matches!(replace.trailer, Some(Some(_))));
        assert_eq!(replace.download_links.map(|l| l.len()), Some(0));
    }
}
