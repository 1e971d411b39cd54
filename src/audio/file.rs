use crate::audio::AudioFrame;
use anyhow::{Context, Result};
use hound::WavReader;
use std::path::Path;
use tracing::info;

/// A WAV file loaded into memory, for playback metadata and for replaying
/// through the recognition pipeline after the fact.
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels",
            duration_seconds, spec.sample_rate, spec.channels
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Slice the file into fixed-duration frames, as a live source would
    /// have delivered them.
    pub fn frames(&self, frame_duration_ms: u64) -> Vec<AudioFrame> {
        let frame_len =
            (self.sample_rate as u64 * self.channels as u64 * frame_duration_ms / 1000) as usize;
        if frame_len == 0 {
            return Vec::new();
        }

        let mut delivered = 0u64;
        self.samples
            .chunks(frame_len)
            .map(|chunk| {
                let timestamp_ms =
                    delivered * 1000 / (self.sample_rate as u64 * self.channels as u64);
                delivered += chunk.len() as u64;
                AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: self.sample_rate,
                    channels: self.channels,
                    timestamp_ms,
                }
            })
            .collect()
    }
}
