//! User preferences as a live-updating signal.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionQuality {
    Fast,
    Balanced,
    Accurate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub notifications_enabled: bool,
    pub auto_save_enabled: bool,
    pub transcription_quality: TranscriptionQuality,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            auto_save_enabled: true,
            transcription_quality: TranscriptionQuality::Balanced,
        }
    }
}

/// Holds the current settings and notifies subscribers on every change.
pub struct SettingsStore {
    tx: watch::Sender<Settings>,
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> Settings {
        self.tx.borrow().clone()
    }

    /// Live signal; consumers re-read on change instead of caching.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    pub fn update(&self, mutate: impl FnOnce(&mut Settings)) {
        self.tx.send_modify(mutate);
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
