use crate::error::CaptureError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved).
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved).
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
    /// Milliseconds of active audio delivered before this frame.
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Duration covered by this frame, in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / (self.sample_rate as u64 * self.channels as u64)
    }
}

/// What a capture source delivers.
///
/// Frames arrive in strict chronological order. Frames lost to device
/// contention are reported as `Dropped`, never silently swallowed.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    Frame(AudioFrame),
    Dropped { count: u32 },
}

/// Configuration for capture sources.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (device audio is converted if needed).
    pub sample_rate: u32,
    /// Target channel count (1 = mono).
    pub channels: u16,
    /// Duration of each delivered frame, 20-100 ms.
    pub frame_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz for speech models
            channels: 1,        // Mono
            frame_duration_ms: 100,
        }
    }
}

impl CaptureConfig {
    /// Samples per delivered frame.
    pub fn frame_len(&self) -> usize {
        (self.sample_rate as u64 * self.channels as u64 * self.frame_duration_ms / 1000) as usize
    }
}

/// Audio capture source.
///
/// `start` hands back the frame channel; `stop` ends delivery and closes it
/// so downstream consumers flush and finalize. Pausing keeps the device open
/// but stops frame ingestion entirely.
#[async_trait]
pub trait CaptureSource: Send {
    /// Begin capturing. Fails with `CaptureError::AlreadyActive` when the
    /// owning device already has an active capture.
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError>;

    /// Stop delivering frames until `resume`. Timestamps do not advance
    /// while paused.
    fn pause(&mut self);

    /// Resume delivery after a pause.
    fn resume(&mut self);

    /// Stop capturing and close the frame channel.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// An audio input device admitting one active capture at a time.
///
/// Sources hold a claim while started; a second `start` against the same
/// device fails fast with `CaptureError::AlreadyActive` instead of silently
/// interleaving two captures.
#[derive(Debug, Clone, Default)]
pub struct InputDevice {
    active: Arc<AtomicBool>,
}

impl InputDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn claim(&self) -> Result<DeviceClaim, CaptureError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CaptureError::AlreadyActive);
        }
        Ok(DeviceClaim {
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Released on drop, including panic/early-return paths.
#[derive(Debug)]
pub(crate) struct DeviceClaim {
    active: Arc<AtomicBool>,
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
