//! Download gate
//!
//! `SelectingQuality → ShowingSources { quality, remaining } → SourcesEnabled { quality }`
//!
//! Picking a quality starts a countdown; source buttons unlock only once it
//! reaches zero. Free sources go through the ad interstitial, the rest open
//! directly.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::config::GateConfig;
use crate::errors::MflixError;
use crate::services::clock::{Clock, elapsed_secs};
use crate::session::SessionContext;
use crate::storage::SourceType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    SelectingQuality,
    ShowingSources { quality: String, remaining: u32 },
    SourcesEnabled { quality: String },
}

/// What the client should do after a source was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GateAction {
    Interstitial { url: String },
    OpenExternal { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    SourcesLocked,
    QualityMismatch { selected: String, requested: String },
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::SourcesLocked => write!(f, "Sources are not available yet"),
            GateError::QualityMismatch {
                selected,
                requested,
            } => write!(
                f,
                "Source quality '{}' does not match selected quality '{}'",
                requested, selected
            ),
        }
    }
}

impl std::error::Error for GateError {}

impl From<GateError> for MflixError {
    fn from(err: GateError) -> Self {
        MflixError::gate(err.to_string())
    }
}

/// A download source as the gate sees it
#[derive(Debug, Clone)]
pub struct GateSource<'a> {
    pub quality: &'a str,
    pub source_type: SourceType,
    pub url: &'a str,
}

/// Interstitial page URL carrying the real destination in `next`
pub fn interstitial_url(interstitial_path: &str, next: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    let separator = if interstitial_path.contains('?') { '&' } else { '?' };
    format!("{}{}next={}", interstitial_path, separator, encoded)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadGate {
    state: GateState,
    countdown_secs: u32,
}

impl DownloadGate {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            state: GateState::SelectingQuality,
            countdown_secs,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// 任何状态下都可以重新选择清晰度，倒计时重置
    pub fn select_quality(&mut self, quality: impl Into<String>) {
        let quality = quality.into();
        self.state = if self.countdown_secs == 0 {
            GateState::SourcesEnabled { quality }
        } else {
            GateState::ShowingSources {
                quality,
                remaining: self.countdown_secs,
            }
        };
    }

    pub fn tick(&mut self) {
        if let GateState::ShowingSources { quality, remaining } = &mut self.state {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                let quality = std::mem::take(quality);
                self.state = GateState::SourcesEnabled { quality };
            }
        }
    }

    /// Apply `secs` one-second ticks
    pub fn advance(&mut self, secs: u64) {
        let mut left = secs;
        while left > 0 && matches!(self.state, GateState::ShowingSources { .. }) {
            self.tick();
            left -= 1;
        }
    }

    pub fn back_to_quality(&mut self) {
        self.state = GateState::SelectingQuality;
    }

    pub fn sources_enabled(&self) -> bool {
        matches!(self.state, GateState::SourcesEnabled { .. })
    }

    pub fn selected_quality(&self) -> Option<&str> {
        match &self.state {
            GateState::SelectingQuality => None,
            GateState::ShowingSources { quality, .. } | GateState::SourcesEnabled { quality } => {
                Some(quality)
            }
        }
    }

    pub fn choose_source(
        &self,
        source: &GateSource<'_>,
        interstitial_path: &str,
    ) -> Result<GateAction, GateError> {
        let GateState::SourcesEnabled { quality } = &self.state else {
            return Err(GateError::SourcesLocked);
        };
        if quality != source.quality {
            return Err(GateError::QualityMismatch {
                selected: quality.clone(),
                requested: source.quality.to_string(),
            });
        }

        Ok(match source.source_type {
            SourceType::Free => GateAction::Interstitial {
                url: interstitial_url(interstitial_path, source.url),
            },
            SourceType::Premium | SourceType::Direct => GateAction::OpenExternal {
                url: source.url.to_string(),
            },
        })
    }
}

/// Gate state as persisted in the session
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredGate {
    gate: DownloadGate,
    last_tick_ms: i64,
}

pub fn gate_key(content_id: i32, episode_id: Option<i32>) -> String {
    match episode_id {
        Some(episode_id) => format!("download_gate_{}_{}", content_id, episode_id),
        None => format!("download_gate_{}", content_id),
    }
}

/// Session-backed download gates; time advances by whole elapsed seconds
pub struct DownloadGateService {
    clock: Arc<dyn Clock>,
    countdown_secs: u32,
    interstitial_path: String,
}

impl DownloadGateService {
    pub fn new(clock: Arc<dyn Clock>, config: &GateConfig) -> Self {
        Self {
            clock,
            countdown_secs: config.download_countdown_secs,
            interstitial_path: config.interstitial_path.clone(),
        }
    }

    pub fn interstitial_path(&self) -> &str {
        &self.interstitial_path
    }

    /// Load (or create) the gate, catch it up to now, run `f`, store it back
    pub async fn with_gate<T>(
        &self,
        session: &SessionContext,
        key: &str,
        f: impl FnOnce(&mut DownloadGate) -> T,
    ) -> T {
        let now = self.clock.now_ms();
        let mut stored = session
            .get_json::<StoredGate>(key)
            .await
            .unwrap_or_else(|| StoredGate {
                gate: DownloadGate::new(self.countdown_secs),
                last_tick_ms: now,
            });

        let elapsed = elapsed_secs(stored.last_tick_ms, now);
        stored.gate.advance(elapsed);
        stored.last_tick_ms = stored
            .last_tick_ms
            .saturating_add(elapsed as i64 * 1000)
            .min(now);

        let before = stored.gate.state.clone();
        let out = f(&mut stored.gate);
        if stored.gate.state != before {
            // 状态切换后从当前时刻重新计时
            stored.last_tick_ms = now;
            debug!(
                "Gate '{}' for session {}: {:?} -> {:?}",
                key,
                session.id(),
                before,
                stored.gate.state
            );
        }

        session.set_json(key, &stored, None).await;
        out
    }
}
