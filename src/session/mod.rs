//! Recording and playback session management
//!
//! This module provides:
//! - The recording state machine (`RecordingController`) coordinating
//!   capture, recognition, and the clock
//! - Pure elapsed-time arithmetic over pause/resume timestamps (`clock`)
//! - The playback mirror state machine (`PlaybackController`)

pub mod clock;
pub mod controller;
pub mod playback;
pub mod state;

pub use controller::{CaptureFactory, FinishedRecording, RecordingController, SessionWarning};
pub use playback::PlaybackController;
pub use state::{ActiveRecording, PlaybackState, RecordingState};
