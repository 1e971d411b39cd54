//! After-the-fact transcription: replay an existing WAV file through the
//! same recognizer and reconciler used for live sessions.

use crate::audio::{AudioFile, AudioFrame};
use crate::stt::engine::SpeechEngine;
use crate::stt::reconciler::{LiveTranscriptView, TranscriptOutcome, TranscriptReconciler};
use crate::stt::recognizer::{self, RecognizerConfig};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

const BATCH_FRAME_MS: u64 = 100;

/// Transcribe a recorded WAV file and return the reconciled outcome.
pub async fn transcribe_file(
    path: impl AsRef<Path>,
    recording_id: &str,
    engine: Box<dyn SpeechEngine>,
) -> Result<TranscriptOutcome> {
    let file = AudioFile::open(&path)?;

    // Interleaved stereo is folded to mono before it reaches the engine.
    let samples: Vec<i16> = if file.channels <= 1 {
        file.samples.clone()
    } else {
        file.samples
            .chunks(file.channels as usize)
            .map(|chunk| {
                (chunk.iter().map(|&s| s as i32).sum::<i32>() / chunk.len() as i32) as i16
            })
            .collect()
    };

    let config = RecognizerConfig {
        sample_rate: file.sample_rate,
        ..RecognizerConfig::default()
    };

    let (frame_tx, frame_rx) = mpsc::channel(64);
    let (event_tx, event_rx) = mpsc::channel(64);

    let recognizer_task = recognizer::spawn(engine, config, frame_rx, event_tx);

    let (live, _) = watch::channel(LiveTranscriptView::default());
    let reconciler = TranscriptReconciler::new(recording_id.to_string(), Arc::new(live));
    let reconciler_task = tokio::spawn(reconciler.run(event_rx, |_| {}));

    let frame_len = (file.sample_rate as u64 * BATCH_FRAME_MS / 1000).max(1) as usize;
    let mut delivered = 0u64;
    for chunk in samples.chunks(frame_len) {
        let frame = AudioFrame {
            samples: chunk.to_vec(),
            sample_rate: file.sample_rate,
            channels: 1,
            timestamp_ms: delivered * 1000 / file.sample_rate as u64,
        };
        delivered += chunk.len() as u64;
        if frame_tx.send(frame).await.is_err() {
            break; // recognizer halted; the outcome will carry the error
        }
    }
    drop(frame_tx);

    recognizer_task
        .await
        .context("Recognition task panicked")?;
    let outcome = reconciler_task
        .await
        .context("Reconciler task panicked")?;

    Ok(outcome)
}
