//! Runtime settings and live reconfiguration.
//!
//! Settings changes arrive as partial updates (only the fields the user
//! touched) and are broadcast over a watch channel, so the scheduler can
//! react to a change without polling.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

pub const DEFAULT_REFRESH_INTERVAL_MINUTES: i64 = 15;

/// Floor applied when computing the effective cooldown.
pub const MIN_REFRESH_INTERVAL_MINUTES: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub refresh_interval_minutes: i64,
    pub access_token: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
            access_token: String::new(),
        }
    }
}

impl Settings {
    /// The cooldown between sync cycles, clamped to the minimum.
    ///
    /// The clamp is what keeps a zero or negative configured interval from
    /// turning the scheduler into a busy loop.
    #[must_use]
    pub fn effective_interval(&self) -> std::time::Duration {
        let minutes = self.refresh_interval_minutes.max(MIN_REFRESH_INTERVAL_MINUTES);
        std::time::Duration::from_secs(minutes as u64 * 60)
    }
}

/// A partial settings change; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub refresh_interval_minutes: Option<i64>,
    pub access_token: Option<String>,
}

impl SettingsUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refresh_interval_minutes.is_none() && self.access_token.is_none()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    /// An update request carried no configuration values at all.
    #[error("no configuration values provided")]
    ConfigurationMissing,
}

/// Owner of the settings watch channel.
///
/// [`SettingsBridge::update`] merges a partial change and broadcasts the
/// result; subscribers hold the matching [`watch::Receiver`].
pub struct SettingsBridge {
    tx: watch::Sender<Settings>,
}

impl SettingsBridge {
    pub fn new(initial: Settings) -> (Self, watch::Receiver<Settings>) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx }, rx)
    }

    /// Merge a partial update and broadcast the merged settings.
    pub fn update(&self, update: SettingsUpdate) -> Result<Settings, SettingsError> {
        if update.is_empty() {
            return Err(SettingsError::ConfigurationMissing);
        }
        let mut merged = self.tx.borrow().clone();
        if let Some(minutes) = update.refresh_interval_minutes {
            merged.refresh_interval_minutes = minutes;
        }
        if let Some(token) = update.access_token {
            merged.access_token = token;
        }
        self.tx.send_replace(merged.clone());
        Ok(merged)
    }

    #[must_use]
    pub fn current(&self) -> Settings {
        self.tx.borrow().clone()
    }
}
