// Shared test doubles for the integration suite.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use voxnote::{Hypothesis, ModelError, ModelFetcher, RecognitionError, SpeechEngine};

/// Engine that replays a prepared script of results, one per inference
/// call, then keeps answering with empty partials.
pub struct ScriptedEngine {
    script: VecDeque<Result<Hypothesis, RecognitionError>>,
    pub calls: u32,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Result<Hypothesis, RecognitionError>>) -> Self {
        Self {
            script: script.into(),
            calls: 0,
        }
    }
}

impl SpeechEngine for ScriptedEngine {
    fn transcribe(
        &mut self,
        _window: &[f32],
        _flush: bool,
    ) -> Result<Hypothesis, RecognitionError> {
        self.calls += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(Hypothesis::partial("")))
    }
}

/// Engine that fails every call.
pub struct FailingEngine;

impl SpeechEngine for FailingEngine {
    fn transcribe(
        &mut self,
        _window: &[f32],
        _flush: bool,
    ) -> Result<Hypothesis, RecognitionError> {
        Err(RecognitionError::EngineFailure("scripted failure".into()))
    }
}

/// Engine that blocks longer than any reasonable inference timeout.
pub struct SlowEngine {
    pub delay: Duration,
}

impl SpeechEngine for SlowEngine {
    fn transcribe(
        &mut self,
        _window: &[f32],
        _flush: bool,
    ) -> Result<Hypothesis, RecognitionError> {
        std::thread::sleep(self.delay);
        Ok(Hypothesis::partial("late"))
    }
}

/// Fetcher that replays a script: `Ok(n)` writes an n-byte file to the
/// destination, `Err(e)` fails the transfer. Counts every call.
pub struct ScriptFetcher {
    script: Mutex<VecDeque<Result<u64, ModelError>>>,
    pub calls: AtomicU32,
    pub delay: Duration,
}

impl ScriptFetcher {
    pub fn new(script: Vec<Result<u64, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ModelFetcher for ScriptFetcher {
    async fn fetch(
        &self,
        _url: &str,
        dest: &Path,
        on_progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
    ) -> Result<(), ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::Unavailable("script exhausted".into())));

        match step {
            Ok(bytes) => {
                std::fs::write(dest, vec![0u8; bytes as usize])
                    .map_err(|e| ModelError::Unavailable(e.to_string()))?;
                on_progress(bytes, Some(bytes));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
