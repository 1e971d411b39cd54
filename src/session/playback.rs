//! Playback session state machine, mirroring the recording side.
//!
//! The controller only tracks state; the actual output device is the
//! presentation layer's concern. Positions are recomputed from absolute
//! timestamps on read, the same no-drift rule the recording clock follows.

use crate::error::{CaptureError, SessionError};
use crate::session::state::{PlaybackState, RecordingState};
use std::sync::Mutex;
use std::time::Instant;
use tokio::sync::watch;
use tracing::info;

pub struct PlaybackController {
    state: watch::Sender<PlaybackState>,
    /// Observed to enforce the exclusive-audio-device policy.
    recording: watch::Receiver<RecordingState>,
    /// Set while Playing: the instant `position_ms` was last snapshotted.
    resumed_at: Mutex<Option<Instant>>,
}

impl PlaybackController {
    pub fn new(recording: watch::Receiver<RecordingState>) -> Self {
        let (state, _) = watch::channel(PlaybackState::Idle);
        Self {
            state,
            recording,
            resumed_at: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Begin playback of a recording. Fails fast with `DeviceBusy` while a
    /// recording session is active rather than interleaving device use.
    pub fn play(
        &self,
        recording_id: &str,
        duration_ms: u64,
    ) -> Result<(), SessionError> {
        if self.recording.borrow().is_recording() {
            return Err(SessionError::Capture(CaptureError::DeviceBusy));
        }

        *self.resumed_at.lock().unwrap() = Some(Instant::now());
        self.state.send_replace(PlaybackState::Playing {
            recording_id: recording_id.to_string(),
            position_ms: 0,
            duration_ms,
            is_looping: false,
        });
        info!("Playback started: {}", recording_id);
        Ok(())
    }

    pub fn pause(&self) -> Result<(), SessionError> {
        let current = self.current_state();
        match current {
            PlaybackState::Playing {
                recording_id,
                position_ms,
                duration_ms,
                is_looping,
            } => {
                *self.resumed_at.lock().unwrap() = None;
                self.state.send_replace(PlaybackState::Paused {
                    recording_id,
                    position_ms,
                    duration_ms,
                    is_looping,
                });
                Ok(())
            }
            _ => Err(SessionError::InvalidTransition(
                "pause requires active playback",
            )),
        }
    }

    pub fn resume(&self) -> Result<(), SessionError> {
        if self.recording.borrow().is_recording() {
            return Err(SessionError::Capture(CaptureError::DeviceBusy));
        }
        let current = self.state.borrow().clone();
        match current {
            PlaybackState::Paused {
                recording_id,
                position_ms,
                duration_ms,
                is_looping,
            } => {
                *self.resumed_at.lock().unwrap() = Some(Instant::now());
                self.state.send_replace(PlaybackState::Playing {
                    recording_id,
                    position_ms,
                    duration_ms,
                    is_looping,
                });
                Ok(())
            }
            _ => Err(SessionError::InvalidTransition(
                "resume requires paused playback",
            )),
        }
    }

    pub fn seek(&self, to_ms: u64) -> Result<(), SessionError> {
        let mut result = Ok(());
        let mut reset_clock = false;
        self.state.send_if_modified(|state| match state {
            PlaybackState::Playing {
                position_ms,
                duration_ms,
                ..
            } => {
                *position_ms = to_ms.min(*duration_ms);
                reset_clock = true;
                true
            }
            PlaybackState::Paused {
                position_ms,
                duration_ms,
                ..
            } => {
                *position_ms = to_ms.min(*duration_ms);
                true
            }
            PlaybackState::Idle => {
                result = Err(SessionError::InvalidTransition("seek requires playback"));
                false
            }
        });
        if reset_clock {
            *self.resumed_at.lock().unwrap() = Some(Instant::now());
        }
        result
    }

    pub fn set_looping(&self, looping: bool) -> Result<(), SessionError> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| match state {
            PlaybackState::Playing { is_looping, .. }
            | PlaybackState::Paused { is_looping, .. } => {
                *is_looping = looping;
                true
            }
            PlaybackState::Idle => {
                result = Err(SessionError::InvalidTransition("no playback to loop"));
                false
            }
        });
        result
    }

    pub fn stop(&self) {
        *self.resumed_at.lock().unwrap() = None;
        self.state.send_replace(PlaybackState::Idle);
    }

    /// State with the position recomputed as of now. While playing with
    /// looping on, the position wraps modulo the duration; otherwise it
    /// clamps at the end.
    pub fn current_state(&self) -> PlaybackState {
        let state = self.state.borrow().clone();
        match state {
            PlaybackState::Playing {
                recording_id,
                position_ms,
                duration_ms,
                is_looping,
            } => {
                let since = self
                    .resumed_at
                    .lock()
                    .unwrap()
                    .map(|at| at.elapsed().as_millis() as u64)
                    .unwrap_or(0);
                let raw = position_ms + since;
                let position_ms = if duration_ms == 0 {
                    0
                } else if is_looping {
                    raw % duration_ms
                } else {
                    raw.min(duration_ms)
                };
                PlaybackState::Playing {
                    recording_id,
                    position_ms,
                    duration_ms,
                    is_looping,
                }
            }
            other => other,
        }
    }

    pub fn position_ms(&self) -> u64 {
        match self.current_state() {
            PlaybackState::Playing { position_ms, .. }
            | PlaybackState::Paused { position_ms, .. } => position_ms,
            PlaybackState::Idle => 0,
        }
    }
}
