//! Recording session controller.
//!
//! Top-level state machine coordinating capture, recognition, and the
//! clock. The controller is the single source of truth for "is recording
//! happening" and the single writer of the published recording state.

use crate::audio::{CaptureConfig, CaptureEvent, CaptureSource, RecordedFile, RecordingWriter};
use crate::error::{CaptureError, RecognitionError, SessionError};
use crate::model::ModelAssetManager;
use crate::session::clock;
use crate::session::state::{ActiveRecording, RecordingState};
use crate::stt::engine::EngineProvider;
use crate::stt::reconciler::{
    LiveTranscriptView, TranscriptOutcome, TranscriptReconciler, TranscriptSegment,
};
use crate::stt::recognizer::{self, RecognizerConfig};
use crate::stt::speaker::assign_speakers;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Non-fatal conditions surfaced to session observers. Loss of
/// transcription never aborts an in-progress recording.
#[derive(Debug, Clone)]
pub enum SessionWarning {
    /// Recognition could not start; audio is still recorded.
    TranscriptionUnavailable(String),
    /// Recognition failed mid-session and halted.
    Recognition(RecognitionError),
    /// Frames were dropped (device contention or a lagging engine).
    FramesDropped { count: u32 },
}

/// Completed recording descriptor handed to the caller for persistence.
#[derive(Debug, Clone, Serialize)]
pub struct FinishedRecording {
    pub recording_id: String,
    pub file_path: PathBuf,
    /// Active (non-paused) duration per the elapsed-time tracker.
    pub duration_ms: u64,
    pub transcript: String,
    pub segments: Vec<TranscriptSegment>,
}

/// Creates one capture source per recording session.
pub trait CaptureFactory: Send + Sync {
    fn create(&self) -> Box<dyn CaptureSource>;
}

impl<F> CaptureFactory for F
where
    F: Fn() -> Box<dyn CaptureSource> + Send + Sync,
{
    fn create(&self) -> Box<dyn CaptureSource> {
        (self)()
    }
}

struct ActivePipeline {
    capture: Box<dyn CaptureSource>,
    fanout: JoinHandle<Result<RecordedFile, CaptureError>>,
    reconciler: JoinHandle<TranscriptOutcome>,
    recognizer: Option<JoinHandle<()>>,
}

pub struct RecordingController {
    capture_factory: Box<dyn CaptureFactory>,
    engine_provider: Option<Box<dyn EngineProvider>>,
    model: Option<Arc<ModelAssetManager>>,
    capture_config: CaptureConfig,
    recognizer_config: RecognizerConfig,
    state: watch::Sender<RecordingState>,
    live: Arc<watch::Sender<LiveTranscriptView>>,
    warnings: broadcast::Sender<SessionWarning>,
    /// Serializes start/pause/resume/stop; holds the running pipeline.
    inner: Mutex<Option<ActivePipeline>>,
}

impl RecordingController {
    pub fn new(capture_factory: impl CaptureFactory + 'static) -> Self {
        let (state, _) = watch::channel(RecordingState::Idle);
        let (live, _) = watch::channel(LiveTranscriptView::default());
        let (warnings, _) = broadcast::channel(32);
        Self {
            capture_factory: Box::new(capture_factory),
            engine_provider: None,
            model: None,
            capture_config: CaptureConfig::default(),
            recognizer_config: RecognizerConfig::default(),
            state,
            live: Arc::new(live),
            warnings,
            inner: Mutex::new(None),
        }
    }

    pub fn with_engine(mut self, provider: impl EngineProvider + 'static) -> Self {
        self.engine_provider = Some(Box::new(provider));
        self
    }

    pub fn with_model(mut self, model: Arc<ModelAssetManager>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_capture_config(mut self, config: CaptureConfig) -> Self {
        self.capture_config = config;
        self
    }

    pub fn with_recognizer_config(mut self, config: RecognizerConfig) -> Self {
        self.recognizer_config = config;
        self
    }

    /// Published recording state; the controller is its only writer.
    pub fn state(&self) -> watch::Receiver<RecordingState> {
        self.state.subscribe()
    }

    pub fn is_recording(&self) -> bool {
        self.state.borrow().is_recording()
    }

    /// Live transcript snapshot stream.
    pub fn live(&self) -> watch::Receiver<LiveTranscriptView> {
        self.live.subscribe()
    }

    /// Non-fatal session warnings.
    pub fn warnings(&self) -> broadcast::Receiver<SessionWarning> {
        self.warnings.subscribe()
    }

    /// Active elapsed milliseconds right now. Cheap; safe to poll from a
    /// UI timer, and never blocks on capture or inference.
    pub fn elapsed_ms(&self) -> u64 {
        let state = self.state.borrow().clone();
        match state.as_active() {
            Some(active) => clock::elapsed_ms(active, clock::now_ms()),
            None => 0,
        }
    }

    /// Start a new recording into `output_dir`.
    ///
    /// Racing calls serialize on the controller lock; the loser is rejected
    /// with `SessionError::AlreadyRecording`, never queued.
    pub async fn start(&self, output_dir: &Path) -> Result<String, SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.is_some() {
            return Err(SessionError::AlreadyRecording);
        }

        let recording_id = uuid::Uuid::new_v4().to_string();
        let file_path = output_dir.join(format!("{}.wav", recording_id));

        let mut capture = self.capture_factory.create();
        let frames = capture.start().await?;

        let writer = match RecordingWriter::create(
            &file_path,
            self.capture_config.sample_rate,
            self.capture_config.channels,
        ) {
            Ok(writer) => writer,
            Err(e) => {
                let _ = capture.stop().await;
                return Err(e.into());
            }
        };

        // Reconciliation always runs; without a recognizer its event
        // channel closes immediately and the outcome is empty.
        let (event_tx, event_rx) = mpsc::channel(64);
        let reconciler = TranscriptReconciler::new(recording_id.clone(), Arc::clone(&self.live));
        let warn_tx = self.warnings.clone();
        let reconciler_handle = tokio::spawn(reconciler.run(event_rx, move |e| {
            let _ = warn_tx.send(SessionWarning::Recognition(e.clone()));
        }));

        let recog_tx = self.spawn_recognizer(event_tx);
        let (recognizer_handle, frame_tx) = match recog_tx {
            Some((handle, tx)) => (Some(handle), Some(tx)),
            None => (None, None),
        };

        let fanout = spawn_fanout(frames, writer, frame_tx, self.warnings.clone());

        let active = ActiveRecording::new(recording_id.clone(), file_path, clock::now_ms());
        self.state.send_replace(RecordingState::Active(active));
        *inner = Some(ActivePipeline {
            capture,
            fanout,
            reconciler: reconciler_handle,
            recognizer: recognizer_handle,
        });

        info!("Recording session started: {}", recording_id);
        Ok(recording_id)
    }

    fn spawn_recognizer(
        &self,
        event_tx: mpsc::Sender<crate::stt::recognizer::HypothesisEvent>,
    ) -> Option<(JoinHandle<()>, mpsc::Sender<crate::audio::AudioFrame>)> {
        let provider = match &self.engine_provider {
            Some(provider) => provider,
            None => {
                self.warn(SessionWarning::TranscriptionUnavailable(
                    "no recognition engine configured".into(),
                ));
                return None;
            }
        };

        if let Some(model) = &self.model {
            if !model.is_ready() {
                self.warn(SessionWarning::TranscriptionUnavailable(
                    "speech model not downloaded yet".into(),
                ));
                return None;
            }
        }

        match provider.create() {
            Ok(engine) => {
                let (frame_tx, frame_rx) = mpsc::channel(256);
                let handle =
                    recognizer::spawn(engine, self.recognizer_config.clone(), frame_rx, event_tx);
                Some((handle, frame_tx))
            }
            Err(e) => {
                warn!("Failed to create recognition engine: {}", e);
                self.warn(SessionWarning::TranscriptionUnavailable(e.to_string()));
                None
            }
        }
    }

    fn warn(&self, warning: SessionWarning) {
        warn!("Session warning: {:?}", warning);
        let _ = self.warnings.send(warning);
    }

    /// Pause an active recording. Frame ingestion stops; recognition may
    /// finish draining what it already has.
    pub async fn pause(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let pipeline = inner.as_mut().ok_or(SessionError::NotRecording)?;

        let mut result = Ok(());
        self.state.send_if_modified(|state| match state {
            RecordingState::Active(active) if !active.is_paused => {
                active.is_paused = true;
                active.pause_start_time_ms = Some(clock::now_ms());
                true
            }
            _ => {
                result = Err(SessionError::InvalidTransition(
                    "pause requires an active, unpaused recording",
                ));
                false
            }
        });
        result?;

        pipeline.capture.pause();
        info!("Recording paused");
        Ok(())
    }

    /// Resume a paused recording, accounting the pause into
    /// `total_paused_duration_ms`.
    pub async fn resume(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let pipeline = inner.as_mut().ok_or(SessionError::NotRecording)?;

        let mut result = Ok(());
        self.state.send_if_modified(|state| match state {
            RecordingState::Active(active) if active.is_paused => {
                let now = clock::now_ms();
                let pause_start = active.pause_start_time_ms.unwrap_or(now);
                active.total_paused_duration_ms += now.saturating_sub(pause_start);
                active.pause_start_time_ms = None;
                active.is_paused = false;
                true
            }
            _ => {
                result = Err(SessionError::InvalidTransition(
                    "resume requires a paused recording",
                ));
                false
            }
        });
        result?;

        pipeline.capture.resume();
        info!("Recording resumed");
        Ok(())
    }

    /// Stop the recording and return the completed descriptor.
    ///
    /// Safe to call even if capture or recognition already failed; partial
    /// results are returned rather than discarded, and `duration_ms` is
    /// always present.
    pub async fn stop(&self) -> Result<FinishedRecording, SessionError> {
        let mut inner = self.inner.lock().await;
        let mut pipeline = inner.take().ok_or(SessionError::NotRecording)?;

        let active = match self.state.borrow().clone() {
            RecordingState::Active(active) => active,
            RecordingState::Idle => return Err(SessionError::NotRecording),
        };

        if let Err(e) = pipeline.capture.stop().await {
            warn!("Capture stop failed: {}", e);
        }

        // Capture stop closed the frame channel; the fan-out drains,
        // finalizes the file, and drops the recognizer input, which flushes
        // the final hypothesis and lets the reconciler finish.
        let recorded = match pipeline.fanout.await {
            Ok(Ok(file)) => Some(file),
            Ok(Err(e)) => {
                error!("Audio writer failed: {}", e);
                None
            }
            Err(e) => {
                error!("Fan-out task panicked: {}", e);
                None
            }
        };

        if let Some(handle) = pipeline.recognizer {
            let _ = handle.await;
        }

        let outcome = match pipeline.reconciler.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Reconciler task panicked: {}", e);
                TranscriptOutcome::default()
            }
        };

        let duration_ms = clock::elapsed_ms(&active, clock::now_ms());
        let mut segments = outcome.segments;
        assign_speakers(&mut segments);

        self.state.send_replace(RecordingState::Idle);

        if let Some(file) = &recorded {
            info!(
                "Recording stopped: {} ({} ms active, {} ms of audio, {} segments)",
                active.recording_id,
                duration_ms,
                file.duration_ms(),
                segments.len()
            );
        }

        Ok(FinishedRecording {
            recording_id: active.recording_id,
            file_path: active.file_path,
            duration_ms,
            transcript: outcome.committed_text,
            segments,
        })
    }
}

/// Owns frame delivery: every frame is written to the WAV file; frames are
/// forwarded to recognition with `try_send` so a slow engine can never
/// backpressure the microphone path.
fn spawn_fanout(
    mut frames: mpsc::Receiver<CaptureEvent>,
    mut writer: RecordingWriter,
    mut recognition: Option<mpsc::Sender<crate::audio::AudioFrame>>,
    warnings: broadcast::Sender<SessionWarning>,
) -> JoinHandle<Result<RecordedFile, CaptureError>> {
    tokio::spawn(async move {
        let mut recognition_lag = 0u32;

        while let Some(event) = frames.recv().await {
            match event {
                CaptureEvent::Frame(frame) => {
                    writer.write_frame(&frame)?;

                    if let Some(tx) = &recognition {
                        match tx.try_send(frame) {
                            Ok(()) => {
                                if recognition_lag > 0 {
                                    let _ = warnings.send(SessionWarning::FramesDropped {
                                        count: recognition_lag,
                                    });
                                    recognition_lag = 0;
                                }
                            }
                            Err(mpsc::error::TrySendError::Full(_)) => recognition_lag += 1,
                            Err(mpsc::error::TrySendError::Closed(_)) => {
                                // Recognizer halted; keep recording audio.
                                recognition = None;
                            }
                        }
                    }
                }
                CaptureEvent::Dropped { count } => {
                    warn!("Capture dropped {} frame(s)", count);
                    let _ = warnings.send(SessionWarning::FramesDropped { count });
                }
            }
        }

        if recognition_lag > 0 {
            let _ = warnings.send(SessionWarning::FramesDropped {
                count: recognition_lag,
            });
        }

        writer.finalize()
    })
}
