//! Streaming speech recognition: the engine seam, the windowed adapter,
//! and transcript reconciliation.

pub mod batch;
pub mod engine;
pub mod reconciler;
pub mod recognizer;
pub mod speaker;

#[cfg(feature = "whisper")]
pub mod whisper;

pub use batch::transcribe_file;
pub use engine::{EngineProvider, Hypothesis, SpeechEngine};
pub use reconciler::{
    is_question, LiveTranscriptView, TranscriptOutcome, TranscriptReconciler, TranscriptSegment,
};
pub use recognizer::{HypothesisEvent, RecognizerConfig};
pub use speaker::assign_speakers;

#[cfg(feature = "whisper")]
pub use whisper::WhisperEngine;
