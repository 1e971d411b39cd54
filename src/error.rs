use thiserror::Error;

/// Model asset acquisition errors.
///
/// Non-fatal to an in-progress recording: a session without a ready model
/// records audio with transcription degraded to "unavailable".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model unavailable: {0}")]
    Unavailable(String),

    #[error("model failed verification: {0}")]
    Corrupt(String),
}

/// Audio capture errors. Fatal to the operation that raised them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("audio device is busy")]
    DeviceBusy,

    #[error("a capture is already active on this device")]
    AlreadyActive,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("capture i/o failure: {0}")]
    IoFailure(String),
}

/// Recognition engine errors. Non-fatal to an in-progress recording.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognitionError {
    #[error("inference engine failure: {0}")]
    EngineFailure(String),

    #[error("inference timed out")]
    Timeout,
}

/// Recording session state machine errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,

    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}
