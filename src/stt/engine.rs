use crate::error::RecognitionError;

/// One transcription result over an audio window.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub text: String,
    /// Whether the engine commits to this text for the window it covers.
    pub is_final: bool,
    /// Interrogative signal from the engine's punctuation model, when it
    /// has one. `None` means "no opinion" and downstream falls back to a
    /// trailing question mark.
    pub is_question: Option<bool>,
}

impl Hypothesis {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            is_question: None,
        }
    }

    pub fn fin(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            is_question: None,
        }
    }
}

/// The opaque speech-recognition capability.
///
/// Given the floating-point mono PCM accumulated for the current utterance,
/// returns a hypothesis. `flush` asks for a final commitment over whatever
/// audio remains (end of stream). Inference may be CPU-bound; callers run
/// it on a blocking-friendly worker, never on the capture-delivery path.
pub trait SpeechEngine: Send {
    fn transcribe(&mut self, window: &[f32], flush: bool) -> Result<Hypothesis, RecognitionError>;
}

/// Creates one engine instance per recording session.
pub trait EngineProvider: Send + Sync {
    fn create(&self) -> Result<Box<dyn SpeechEngine>, RecognitionError>;
}

impl<F> EngineProvider for F
where
    F: Fn() -> Result<Box<dyn SpeechEngine>, RecognitionError> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn SpeechEngine>, RecognitionError> {
        (self)()
    }
}
