use crate::audio::capture::{
    AudioFrame, CaptureConfig, CaptureEvent, CaptureSource, DeviceClaim, InputDevice,
};
use crate::error::CaptureError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

const PAUSE_POLL: Duration = Duration::from_millis(2);

/// Deterministic capture source delivering a prepared sample script.
///
/// Used by tests and by after-the-fact file transcription: same trait, same
/// ordering and pause semantics as the microphone, no device required.
pub struct ScriptedSource {
    device: InputDevice,
    config: CaptureConfig,
    samples: Arc<Vec<i16>>,
    frame_delay: Duration,
    looped: bool,
    shared: Arc<Shared>,
    claim: Option<DeviceClaim>,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Shared {
    paused: AtomicBool,
    stopped: AtomicBool,
}

impl ScriptedSource {
    pub fn new(device: InputDevice, config: CaptureConfig, samples: Vec<i16>) -> Self {
        Self {
            device,
            config,
            samples: Arc::new(samples),
            frame_delay: Duration::ZERO,
            looped: false,
            shared: Arc::new(Shared::default()),
            claim: None,
            task: None,
        }
    }

    /// Replay the script forever (until `stop`) instead of once.
    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }

    /// Pace delivery instead of sending frames back-to-back.
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// A source that produces silence until stopped.
    pub fn silence(device: InputDevice, config: CaptureConfig) -> Self {
        let one_second = vec![0i16; (config.sample_rate as usize) * config.channels as usize];
        Self::new(device, config, one_second)
            .looped()
            .with_frame_delay(Duration::from_millis(1))
    }
}

#[async_trait]
impl CaptureSource for ScriptedSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        let claim = self.device.claim()?;
        self.claim = Some(claim);

        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.stopped.store(false, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(64);
        let samples = Arc::clone(&self.samples);
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let frame_delay = self.frame_delay;
        let looped = self.looped;

        let task = tokio::spawn(async move {
            let frame_len = config.frame_len().max(1);
            let mut offset = 0usize;
            let mut delivered = 0u64;

            loop {
                if shared.stopped.load(Ordering::SeqCst) {
                    break;
                }
                if shared.paused.load(Ordering::SeqCst) {
                    tokio::time::sleep(PAUSE_POLL).await;
                    continue;
                }
                if offset >= samples.len() {
                    if looped && !samples.is_empty() {
                        offset = 0;
                    } else {
                        break;
                    }
                }

                let end = (offset + frame_len).min(samples.len());
                let chunk = samples[offset..end].to_vec();
                offset = end;

                let timestamp_ms =
                    delivered * 1000 / (config.sample_rate as u64 * config.channels as u64);
                delivered += chunk.len() as u64;

                let frame = AudioFrame {
                    samples: chunk,
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms,
                };

                if tx.send(CaptureEvent::Frame(frame)).await.is_err() {
                    break; // receiver gone
                }

                if !frame_delay.is_zero() {
                    tokio::time::sleep(frame_delay).await;
                }
            }
        });

        self.task = Some(task);
        Ok(rx)
    }

    fn pause(&mut self) {
        self.shared.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        self.shared.paused.store(false, Ordering::SeqCst);
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.shared.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            // The task may be parked on a full channel; aborting drops its
            // sender, which closes the channel once buffered frames drain.
            task.abort();
            let _ = task.await;
        }
        self.claim = None;
        info!("Scripted capture stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
