use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Recording state published by the session controller.
///
/// The controller is the single writer; everything else observes a snapshot
/// through `watch`. There is no direct Idle -> paused transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    Active(ActiveRecording),
}

impl RecordingState {
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Active(_))
    }

    pub fn as_active(&self) -> Option<&ActiveRecording> {
        match self {
            RecordingState::Active(active) => Some(active),
            RecordingState::Idle => None,
        }
    }
}

/// One recording attempt.
///
/// Invariant: `pause_start_time_ms` is set if and only if `is_paused` is
/// true, and `total_paused_duration_ms` only grows, only on resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRecording {
    /// Unique session identifier.
    pub recording_id: String,

    /// Destination of the captured audio.
    pub file_path: PathBuf,

    /// Wall clock (ms since epoch) at the first start.
    pub start_time_ms: u64,

    /// Whether the session is currently paused.
    pub is_paused: bool,

    /// Wall clock at the moment the current pause began.
    pub pause_start_time_ms: Option<u64>,

    /// Cumulative paused time across all pause/resume cycles.
    pub total_paused_duration_ms: u64,
}

impl ActiveRecording {
    pub fn new(recording_id: String, file_path: PathBuf, start_time_ms: u64) -> Self {
        Self {
            recording_id,
            file_path,
            start_time_ms,
            is_paused: false,
            pause_start_time_ms: None,
            total_paused_duration_ms: 0,
        }
    }
}

/// Playback state, mirroring the recording side.
///
/// The playback controller is the single writer; `position_ms` in a
/// published snapshot is the position at the moment of the last transition.
/// Consumers needing a live position ask the controller, which recomputes
/// it from absolute timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Playing {
        recording_id: String,
        position_ms: u64,
        duration_ms: u64,
        is_looping: bool,
    },
    Paused {
        recording_id: String,
        position_ms: u64,
        duration_ms: u64,
        is_looping: bool,
    },
}
