//! Redirect loop manager
//!
//! Decides whether a click on a monetized slot ("position") is bounced
//! through an advertiser URL first, and remembers where the visitor was
//! headed so the return trip (`?from_redirect=<position>`) can finish it.
//!
//! Session keys:
//! - `redirect_<position>_<bucket>`: already redirected in this time bucket
//! - `original_url_<position>`: where the visitor wanted to go
//! - `redirect_from_<position>`: the page that started the redirect

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::{Url, form_urlencoded};

use crate::config::SessionConfig;
use crate::errors::Result;
use crate::services::clock::Clock;
use crate::session::SessionContext;
use crate::storage::{RedirectLink, SeaOrmStorage};

/// Query parameter marking a return from an advertiser
pub const RETURN_MARKER_PARAM: &str = "from_redirect";

/// Where active redirect links come from
#[async_trait]
pub trait RedirectLinkSource: Send + Sync {
    async fn fetch_redirect_links(&self, position: &str) -> Result<Vec<RedirectLink>>;
}

#[async_trait]
impl RedirectLinkSource for SeaOrmStorage {
    async fn fetch_redirect_links(&self, position: &str) -> Result<Vec<RedirectLink>> {
        self.active_redirect_links(position).await
    }
}

pub fn redirect_flag_key(position: &str, bucket: i64) -> String {
    format!("redirect_{}_{}", position, bucket)
}

pub fn original_url_key(position: &str) -> String {
    format!("original_url_{}", position)
}

pub fn redirect_from_key(position: &str) -> String {
    format!("redirect_from_{}", position)
}

/// Result of consuming a return marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackNavigation {
    pub position: String,
    /// The current URL with the marker removed
    pub cleaned_url: String,
    /// Stashed destination, `None` when nothing was stashed or it expired
    pub target: Option<String>,
}

/// Append `from_redirect=<position>` to a URL, keeping any fragment last
pub fn with_return_marker(target: &str, position: &str) -> String {
    if let Ok(mut url) = Url::parse(target) {
        url.query_pairs_mut()
            .append_pair(RETURN_MARKER_PARAM, position);
        return url.to_string();
    }

    let (base, fragment) = match target.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (target, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    let encoded: String = form_urlencoded::byte_serialize(position.as_bytes()).collect();

    let mut out = format!("{}{}{}={}", base, separator, RETURN_MARKER_PARAM, encoded);
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Split the return marker off a URL
///
/// Returns the marked position (if any) and the URL without the marker.
/// Works on absolute URLs and on bare `path?query` strings.
pub fn strip_return_marker(url: &str) -> (Option<String>, String) {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let Some((path, query)) = without_fragment.split_once('?') else {
        return (None, url.to_string());
    };

    // 只删除标记段，其余参数按原始字节保留
    let mut position = None;
    let kept: Vec<&str> = query
        .split('&')
        .filter(|segment| {
            let Some((key, value)) = form_urlencoded::parse(segment.as_bytes()).next() else {
                return true;
            };
            if key != RETURN_MARKER_PARAM {
                return true;
            }
            if position.is_none() && !value.is_empty() {
                position = Some(value.into_owned());
            }
            false
        })
        .collect();

    if position.is_none() {
        return (None, url.to_string());
    }

    let mut cleaned = path.to_string();
    if !kept.is_empty() {
        cleaned.push('?');
        cleaned.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        cleaned.push('#');
        cleaned.push_str(fragment);
    }
    (position, cleaned)
}

pub struct RedirectLoopManager {
    source: Arc<dyn RedirectLinkSource>,
    clock: Arc<dyn Clock>,
    bucket_ms: i64,
    stash_ttl: Duration,
}

impl RedirectLoopManager {
    pub fn new(
        source: Arc<dyn RedirectLinkSource>,
        clock: Arc<dyn Clock>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            source,
            clock,
            bucket_ms: i64::try_from(config.redirect_bucket_secs.max(1).saturating_mul(1000))
                .unwrap_or(i64::MAX),
            stash_ttl: Duration::from_secs(config.stash_ttl_secs),
        }
    }

    fn current_bucket(&self) -> i64 {
        self.clock.now_ms().div_euclid(self.bucket_ms)
    }

    /// 查询失败时返回空列表（fail-open）
    pub async fn get_redirect_links(&self, position: &str) -> Vec<RedirectLink> {
        match self.source.fetch_redirect_links(position).await {
            Ok(links) => links,
            Err(e) => {
                warn!("Redirect link lookup failed for '{}': {}", position, e);
                Vec::new()
            }
        }
    }

    /// Pick an advertiser URL for this click, or `None` to proceed normally
    pub async fn handle_redirect(
        &self,
        session: &SessionContext,
        position: &str,
        original_url: Option<&str>,
        current_url: &str,
    ) -> Option<String> {
        let links = self.get_redirect_links(position).await;
        if links.is_empty() {
            debug!("No redirect links for position '{}'", position);
            return None;
        }

        let flag_key = redirect_flag_key(position, self.current_bucket());
        if session.get_string(&flag_key).await.is_some() {
            debug!(
                "Position '{}' already redirected in this bucket for session {}",
                position,
                session.id()
            );
            return None;
        }

        let chosen = &links[rand::random_range(0..links.len())];

        session
            .set_string(&flag_key, "true", Some(self.stash_ttl))
            .await;
        if let Some(original) = original_url {
            session
                .set_string(&original_url_key(position), original, Some(self.stash_ttl))
                .await;
        }
        session
            .set_string(
                &redirect_from_key(position),
                current_url,
                Some(self.stash_ttl),
            )
            .await;

        info!(
            "Redirecting session {} at '{}' through link {}",
            session.id(),
            position,
            chosen.id
        );
        Some(chosen.redirect_url.clone())
    }

    /// Consume a return marker and recover the stashed destination
    ///
    /// Both stashed URLs are deleted whether or not one was found.
    pub async fn handle_back_navigation(
        &self,
        session: &SessionContext,
        current_url: &str,
    ) -> Option<BackNavigation> {
        let (position, cleaned_url) = strip_return_marker(current_url);
        let position = position?;

        let original_key = original_url_key(&position);
        let from_key = redirect_from_key(&position);

        let target = match session.get_string(&original_key).await {
            Some(url) => Some(url),
            None => session.get_string(&from_key).await,
        };
        session.remove(&original_key).await;
        session.remove(&from_key).await;

        debug!(
            "Back navigation for '{}' (session {}): target={:?}",
            position,
            session.id(),
            target
        );
        Some(BackNavigation {
            position,
            cleaned_url,
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(redirect_flag_key("download_cta_1", 172_800_000), "redirect_download_cta_1_172800000");
        assert_eq!(original_url_key("page_switch"), "original_url_page_switch");
        assert_eq!(redirect_from_key("page_switch"), "redirect_from_page_switch");
    }

    #[test]
    fn test_with_return_marker_separator() {
        assert_eq!(
            with_return_marker("https://ads.example.com/click", "download_cta_1"),
            "https://ads.example.com/click?from_redirect=download_cta_1"
        );
        assert_eq!(
            with_return_marker("https://ads.example.com/click?id=7", "download_cta_1"),
            "https://ads.example.com/click?id=7&from_redirect=download_cta_1"
        );
        assert_eq!(
            with_return_marker("/content/3#downloads", "page_switch"),
            "/content/3?from_redirect=page_switch#downloads"
        );
    }

    #[test]
    fn test_strip_return_marker() {
        assert_eq!(
            strip_return_marker("/content/3?from_redirect=download_cta_1"),
            (Some("download_cta_1".to_string()), "/content/3".to_string())
        );
        assert_eq!(
            strip_return_marker("/content/3?tab=eps&from_redirect=p1#top"),
            (Some("p1".to_string()), "/content/3?tab=eps#top".to_string())
        );
        assert_eq!(
            strip_return_marker("/content/3?tab=eps"),
            (None, "/content/3?tab=eps".to_string())
        );
        assert_eq!(
            strip_return_marker("/content/3?from_redirect="),
            (None, "/content/3?from_redirect=".to_string())
        );
    }

    #[test]
    fn test_strip_keeps_other_params_verbatim() {
        assert_eq!(
            strip_return_marker("/search?q=star%20wars&flag&from_redirect=page_switch&x=a+b"),
            (
                Some("page_switch".to_string()),
                "/search?q=star%20wars&flag&x=a+b".to_string()
            )
        );
        assert_eq!(
            strip_return_marker("/content/3?from_redirect=p1&from_redirect=p2&tab=eps"),
            (Some("p1".to_string()), "/content/3?tab=eps".to_string())
        );
    }

    struct NoLinks;

    #[async_trait]
    impl RedirectLinkSource for NoLinks {
        async fn fetch_redirect_links(&self, _position: &str) -> Result<Vec<RedirectLink>> {
            Ok(Vec::new())
        }
    }

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn test_huge_bucket_size_saturates() {
        let config = SessionConfig {
            redirect_bucket_secs: u64::MAX,
            ..SessionConfig::default()
        };
        let manager = RedirectLoopManager::new(
            Arc::new(NoLinks),
            Arc::new(FixedClock(1_700_000_000_000)),
            &config,
        );
        assert_eq!(manager.bucket_ms, i64::MAX);
        assert_eq!(manager.current_bucket(), 0);

        let config = SessionConfig {
            redirect_bucket_secs: 0,
            ..SessionConfig::default()
        };
        let manager = RedirectLoopManager::new(Arc::new(NoLinks), Arc::new(FixedClock(0)), &config);
        assert_eq!(manager.bucket_ms, 1000);
    }

    #[test]
    fn test_marker_round_trip() {
        let marked = with_return_marker("https://example.com/watch?v=1", "page_switch");
        let (position, cleaned) = strip_return_marker(&marked);
        assert_eq!(position.as_deref(), Some("page_switch"));
        assert_eq!(cleaned, "https://example.com/watch?v=1");
    }
}
