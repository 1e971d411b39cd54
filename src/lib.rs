pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod prefs;
pub mod session;
pub mod store;
pub mod stt;

pub use audio::{
    AudioFile, AudioFrame, CaptureConfig, CaptureEvent, CaptureSource, InputDevice,
    MicrophoneSource, RecordedFile, RecordingWriter, ScriptedSource,
};
pub use crate::config::Config;
pub use error::{CaptureError, ModelError, RecognitionError, SessionError};
pub use http::{create_router, AppState};
pub use model::{HttpFetcher, ModelAssetManager, ModelFetcher, ModelSpec};
pub use prefs::{Settings, SettingsStore, TranscriptionQuality};
pub use session::{
    ActiveRecording, CaptureFactory, FinishedRecording, PlaybackController, PlaybackState,
    RecordingController, RecordingState, SessionWarning,
};
pub use store::{FlashcardRecord, MemoryStore, NoteRecord, RecordingRecord, RecordingStore};
pub use stt::{
    EngineProvider, Hypothesis, HypothesisEvent, LiveTranscriptView, RecognizerConfig,
    SpeechEngine, TranscriptOutcome, TranscriptReconciler, TranscriptSegment,
};
