//! Streaming recognition adapter.
//!
//! Consumes the capture frame sequence, accumulates the audio window since
//! the last finalized hypothesis, and drives the inference engine at a fixed
//! cadence. Coverage timestamps derive from consumed sample counts, so they
//! are non-decreasing by construction.

use crate::audio::AudioFrame;
use crate::error::RecognitionError;
use crate::stt::engine::SpeechEngine;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Recognition output, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum HypothesisEvent {
    /// Best-effort guess over audio received so far; superseded by the
    /// next event.
    Partial { text: String, coverage_end_ms: u64 },
    /// Commitment that `[start_ms, end_ms)` is fully transcribed and will
    /// not be revised.
    Final {
        text: String,
        start_ms: u64,
        end_ms: u64,
        is_question: Option<bool>,
    },
    /// Recognition halted for this session.
    Error(RecognitionError),
}

#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// Sample rate of incoming frames.
    pub sample_rate: u32,
    /// How much new audio accumulates before an inference pass.
    pub window_ms: u64,
    /// Attempts per window before giving up on the session.
    pub max_attempts: u32,
    /// Upper bound on a single inference call.
    pub inference_timeout: Duration,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            window_ms: 1000,
            max_attempts: 3,
            inference_timeout: Duration::from_secs(30),
        }
    }
}

const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Spawn the recognition task for one session.
///
/// The task ends when the frame channel closes (flushing the residual
/// window as a final hypothesis) or after an `Error` event — it never goes
/// silent while leaving the channel open.
pub fn spawn(
    engine: Box<dyn SpeechEngine>,
    config: RecognizerConfig,
    frames: mpsc::Receiver<AudioFrame>,
    events: mpsc::Sender<HypothesisEvent>,
) -> JoinHandle<()> {
    tokio::spawn(run(engine, config, frames, events))
}

async fn run(
    engine: Box<dyn SpeechEngine>,
    config: RecognizerConfig,
    mut frames: mpsc::Receiver<AudioFrame>,
    events: mpsc::Sender<HypothesisEvent>,
) {
    let window_samples = (config.sample_rate as u64 * config.window_ms / 1000).max(1) as usize;
    let mut slot = Some(engine);
    let mut window: Vec<f32> = Vec::new();
    let mut pending = 0usize;
    let mut last_final_end_ms = 0u64;

    while let Some(frame) = frames.recv().await {
        window.extend(frame.samples.iter().map(|&s| s as f32 / i16::MAX as f32));
        pending += frame.samples.len();

        if pending < window_samples {
            continue;
        }
        pending = 0;

        let coverage_end_ms = last_final_end_ms + window_len_ms(&window, config.sample_rate);
        match infer(&mut slot, &window, false, &config).await {
            Ok(hyp) => {
                let event = if hyp.is_final {
                    let event = HypothesisEvent::Final {
                        text: hyp.text,
                        start_ms: last_final_end_ms,
                        end_ms: coverage_end_ms,
                        is_question: hyp.is_question,
                    };
                    last_final_end_ms = coverage_end_ms;
                    window.clear();
                    event
                } else {
                    HypothesisEvent::Partial {
                        text: hyp.text,
                        coverage_end_ms,
                    }
                };
                if events.send(event).await.is_err() {
                    return; // consumer gone
                }
            }
            Err(e) => {
                warn!("Recognition halted: {}", e);
                let _ = events.send(HypothesisEvent::Error(e)).await;
                return;
            }
        }
    }

    // Input closed: flush whatever audio remains as a final commitment.
    if !window.is_empty() {
        let coverage_end_ms = last_final_end_ms + window_len_ms(&window, config.sample_rate);
        match infer(&mut slot, &window, true, &config).await {
            Ok(hyp) => {
                if !hyp.text.trim().is_empty() {
                    let _ = events
                        .send(HypothesisEvent::Final {
                            text: hyp.text,
                            start_ms: last_final_end_ms,
                            end_ms: coverage_end_ms,
                            is_question: hyp.is_question,
                        })
                        .await;
                }
            }
            Err(e) => {
                warn!("Flush inference failed: {}", e);
                let _ = events.send(HypothesisEvent::Error(e)).await;
            }
        }
    }

    info!("Recognition task finished");
}

fn window_len_ms(window: &[f32], sample_rate: u32) -> u64 {
    window.len() as u64 * 1000 / sample_rate.max(1) as u64
}

/// One inference pass with bounded retry over the same window.
///
/// The engine hops to the blocking pool for the CPU-bound call. A timed-out
/// call is abandoned (its result discarded), which also abandons the engine
/// instance — retrying is only possible while the engine is recoverable.
async fn infer(
    slot: &mut Option<Box<dyn SpeechEngine>>,
    window: &[f32],
    flush: bool,
    config: &RecognizerConfig,
) -> Result<crate::stt::engine::Hypothesis, RecognitionError> {
    let mut last_err = RecognitionError::EngineFailure("engine unavailable".into());

    for attempt in 1..=config.max_attempts {
        let engine = match slot.take() {
            Some(engine) => engine,
            None => return Err(last_err),
        };

        let samples = window.to_vec();
        let call = tokio::task::spawn_blocking(move || {
            let mut engine = engine;
            let result = engine.transcribe(&samples, flush);
            (engine, result)
        });

        match tokio::time::timeout(config.inference_timeout, call).await {
            Ok(Ok((engine, result))) => {
                *slot = Some(engine);
                match result {
                    Ok(hyp) => return Ok(hyp),
                    Err(e) => {
                        warn!(
                            "Inference attempt {}/{} failed: {}",
                            attempt, config.max_attempts, e
                        );
                        last_err = e;
                    }
                }
            }
            Ok(Err(join_err)) => {
                last_err =
                    RecognitionError::EngineFailure(format!("inference task died: {}", join_err));
            }
            Err(_) => {
                warn!(
                    "Inference attempt {}/{} timed out",
                    attempt, config.max_attempts
                );
                last_err = RecognitionError::Timeout;
            }
        }

        tokio::time::sleep(RETRY_BACKOFF).await;
    }

    Err(last_err)
}
