//! Microphone capture via cpal.

use crate::audio::capture::{
    AudioFrame, CaptureConfig, CaptureEvent, CaptureSource, DeviceClaim, InputDevice,
};
use crate::error::CaptureError;
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Channel capacity between the realtime callback and the async consumer.
/// The callback never blocks: a full channel counts a dropped frame instead.
const FRAME_CHANNEL_CAPACITY: usize = 32;

/// cpal streams are not `Send`; the stream is only ever dropped from the
/// owning source, never used from another thread.
struct SafeStream {
    _stream: cpal::Stream,
}

unsafe impl Send for SafeStream {}

#[derive(Default)]
struct Shared {
    paused: AtomicBool,
}

/// Converts device samples to normalized f32 in [-1.0, 1.0].
trait ToNormalizedSample: Copy {
    fn to_normalized(self) -> f32;
}

impl ToNormalizedSample for i8 {
    #[inline]
    fn to_normalized(self) -> f32 {
        self as f32 / i8::MAX as f32
    }
}

impl ToNormalizedSample for i16 {
    #[inline]
    fn to_normalized(self) -> f32 {
        self as f32 / i16::MAX as f32
    }
}

impl ToNormalizedSample for i32 {
    #[inline]
    fn to_normalized(self) -> f32 {
        self as f32 / i32::MAX as f32
    }
}

impl ToNormalizedSample for f32 {
    #[inline]
    fn to_normalized(self) -> f32 {
        self
    }
}

/// Linear resampler; good enough for speech-model input.
pub(crate) fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if input.is_empty() || from_rate == to_rate {
        return input.to_vec();
    }

    let ratio = from_rate as f32 / to_rate as f32;
    let out_len = (input.len() as f32 / ratio) as usize;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f32 * ratio;
            let idx = (pos as usize).min(last);
            let frac = pos - idx as f32;
            let a = input[idx];
            let b = input[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

/// Interleaved device samples -> normalized mono.
fn downmix_to_mono<T: ToNormalizedSample>(data: &[T], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.iter().map(|s| s.to_normalized()).collect();
    }
    data.chunks(channels)
        .map(|chunk| chunk.iter().map(|s| s.to_normalized()).sum::<f32>() / channels as f32)
        .collect()
}

#[inline]
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Captures the default input device and delivers fixed-duration mono
/// frames at the configured target rate.
pub struct MicrophoneSource {
    device: InputDevice,
    config: CaptureConfig,
    shared: Arc<Shared>,
    stream: Option<SafeStream>,
    claim: Option<DeviceClaim>,
}

impl MicrophoneSource {
    pub fn new(device: InputDevice, config: CaptureConfig) -> Self {
        Self {
            device,
            config,
            shared: Arc::new(Shared::default()),
            stream: None,
            claim: None,
        }
    }

    fn map_build_error(e: cpal::BuildStreamError) -> CaptureError {
        match e {
            cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceBusy,
            other => {
                let msg = other.to_string();
                if msg.to_lowercase().contains("permission") {
                    CaptureError::PermissionDenied
                } else {
                    CaptureError::IoFailure(msg)
                }
            }
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        stream_config: &cpal::StreamConfig,
        device_channels: usize,
        device_rate: u32,
        target: CaptureConfig,
        shared: Arc<Shared>,
        tx: mpsc::Sender<CaptureEvent>,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: ToNormalizedSample + cpal::SizedSample,
    {
        let frame_len = target.frame_len().max(1);
        let mut pending: Vec<i16> = Vec::with_capacity(frame_len * 2);
        let mut delivered: u64 = 0;
        let mut dropped: u32 = 0;

        let err_fn = |err: cpal::StreamError| {
            error!("Microphone stream error: {}", err);
        };

        device.build_input_stream(
            stream_config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if shared.paused.load(Ordering::SeqCst) {
                    return;
                }

                let mono = downmix_to_mono(data, device_channels);
                let resampled = resample_linear(&mono, device_rate, target.sample_rate);
                pending.extend(resampled.iter().copied().map(to_i16));

                while pending.len() >= frame_len {
                    let samples: Vec<i16> = pending.drain(..frame_len).collect();
                    let timestamp_ms = delivered * 1000 / target.sample_rate as u64;
                    delivered += samples.len() as u64;

                    if dropped > 0 {
                        if tx
                            .try_send(CaptureEvent::Dropped { count: dropped })
                            .is_ok()
                        {
                            dropped = 0;
                        }
                    }

                    let frame = AudioFrame {
                        samples,
                        sample_rate: target.sample_rate,
                        channels: target.channels,
                        timestamp_ms,
                    };

                    match tx.try_send(CaptureEvent::Frame(frame)) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => dropped += 1,
                        Err(mpsc::error::TrySendError::Closed(_)) => return,
                    }
                }
            },
            err_fn,
            None,
        )
    }
}

#[async_trait]
impl CaptureSource for MicrophoneSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        let claim = self.device.claim()?;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::IoFailure("no default input device".into()))?;

        let supported = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => CaptureError::DeviceBusy,
            other => CaptureError::IoFailure(other.to_string()),
        })?;

        let device_rate = supported.sample_rate().0;
        let device_channels = supported.channels() as usize;
        let stream_config: cpal::StreamConfig = supported.config();

        info!(
            "Starting microphone capture: {} Hz, {} ch -> {} Hz mono",
            device_rate, device_channels, self.config.sample_rate
        );

        self.shared.paused.store(false, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let shared = Arc::clone(&self.shared);
        let target = self.config.clone();

        let stream = match supported.sample_format() {
            cpal::SampleFormat::I8 => Self::build_stream::<i8>(
                &device,
                &stream_config,
                device_channels,
                device_rate,
                target,
                shared,
                tx,
            ),
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &stream_config,
                device_channels,
                device_rate,
                target,
                shared,
                tx,
            ),
            cpal::SampleFormat::I32 => Self::build_stream::<i32>(
                &device,
                &stream_config,
                device_channels,
                device_rate,
                target,
                shared,
                tx,
            ),
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &stream_config,
                device_channels,
                device_rate,
                target,
                shared,
                tx,
            ),
            other => {
                return Err(CaptureError::IoFailure(format!(
                    "unsupported sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(Self::map_build_error)?;

        stream.play().map_err(|e| {
            warn!("Failed to start microphone stream: {}", e);
            CaptureError::DeviceBusy
        })?;

        self.stream = Some(SafeStream { _stream: stream });
        self.claim = Some(claim);
        Ok(rx)
    }

    fn pause(&mut self) {
        self.shared.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        self.shared.paused.store(false, Ordering::SeqCst);
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        // Dropping the stream ends the callbacks and closes the frame
        // channel, which lets downstream consumers flush.
        self.stream = None;
        self.claim = None;
        info!("Microphone capture stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "microphone"
    }
}
