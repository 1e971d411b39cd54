//! whisper.cpp-backed speech engine (cargo feature `whisper`).

use crate::error::RecognitionError;
use crate::stt::engine::{Hypothesis, SpeechEngine};
use std::path::Path;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

pub struct WhisperEngine {
    ctx: WhisperContext,
}

impl WhisperEngine {
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, RecognitionError> {
        let path = model_path.as_ref().to_string_lossy().to_string();
        let ctx = WhisperContext::new_with_params(&path, WhisperContextParameters::default())
            .map_err(|e| RecognitionError::EngineFailure(format!("load model: {}", e)))?;
        Ok(Self { ctx })
    }
}

impl SpeechEngine for WhisperEngine {
    fn transcribe(&mut self, window: &[f32], flush: bool) -> Result<Hypothesis, RecognitionError> {
        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| RecognitionError::EngineFailure(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_language(Some("en"));

        state
            .full(params, window)
            .map_err(|e| RecognitionError::EngineFailure(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| RecognitionError::EngineFailure(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| RecognitionError::EngineFailure(e.to_string()))?;
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(segment.trim());
        }

        // Whisper re-decodes the whole window each pass; only the flush at
        // end of stream is a commitment.
        Ok(Hypothesis {
            text,
            is_final: flush,
            is_question: None,
        })
    }
}
