use crate::audio::AudioFrame;
use crate::error::CaptureError;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::warn;

/// The finalized audio file a writer produces.
#[derive(Debug, Clone)]
pub struct RecordedFile {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_count: usize,
}

impl RecordedFile {
    /// Audio duration derived from the written sample count.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        self.sample_count as u64 * 1000 / (self.sample_rate as u64 * self.channels as u64)
    }
}

/// Writes one recording to disk as a WAV file.
///
/// The WAV header is only valid after `finalize`; the `Drop` guard closes
/// the file on abnormal paths so a crash does not leave a torn header.
pub struct RecordingWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    sample_count: usize,
}

impl RecordingWriter {
    pub fn create(
        path: impl AsRef<Path>,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CaptureError::IoFailure(format!("create {:?}: {}", parent, e)))?;
        }

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&path, spec)
            .map_err(|e| CaptureError::IoFailure(format!("create WAV {:?}: {}", path, e)))?;

        Ok(Self {
            writer: Some(writer),
            path,
            sample_rate,
            channels,
            sample_count: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<(), CaptureError> {
        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| CaptureError::IoFailure(format!("write sample: {}", e)))?;
            }
            self.sample_count += frame.samples.len();
        }
        Ok(())
    }

    /// Flush buffered audio and patch the WAV header.
    pub fn finalize(mut self) -> Result<RecordedFile, CaptureError> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| CaptureError::IoFailure(format!("finalize WAV: {}", e)))?;
        }

        Ok(RecordedFile {
            path: self.path.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            sample_count: self.sample_count,
        })
    }
}

impl Drop for RecordingWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
