//! Transcript reconciliation.
//!
//! Merges partial and final hypothesis events, in arrival order, into an
//! append-only ordered transcript plus the in-flight partial suffix. The
//! reconciler is the single writer of the live view; readers hold a watch
//! snapshot and need no further synchronization.

use crate::error::RecognitionError;
use crate::stt::recognizer::HypothesisEvent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::warn;

/// A finalized, time-bounded span of speech. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: String,
    pub recording_id: String,
    /// Milliseconds relative to recording start.
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub is_question: bool,
    /// Voice label when exactly two speakers were distinguished.
    pub speaker: Option<u8>,
}

/// Ephemeral, in-memory view consumed by real-time display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveTranscriptView {
    /// Concatenation of finalized segments so far.
    pub committed_text: String,
    /// Current best-guess suffix, not yet finalized. Never persisted.
    pub partial_text: String,
}

impl LiveTranscriptView {
    /// What a display renders.
    pub fn display_text(&self) -> String {
        match (self.committed_text.is_empty(), self.partial_text.is_empty()) {
            (_, true) => self.committed_text.clone(),
            (true, false) => self.partial_text.clone(),
            (false, false) => format!("{} {}", self.committed_text, self.partial_text),
        }
    }
}

/// Question detection policy: the engine's signal wins when present, else a
/// trailing `?` on the trimmed text.
pub fn is_question(text: &str, engine_signal: Option<bool>) -> bool {
    engine_signal.unwrap_or_else(|| text.trim_end().ends_with('?'))
}

/// What a reconciled session hands back at the end.
#[derive(Debug, Default)]
pub struct TranscriptOutcome {
    pub segments: Vec<TranscriptSegment>,
    pub committed_text: String,
    pub error: Option<RecognitionError>,
}

pub struct TranscriptReconciler {
    recording_id: String,
    segments: Vec<TranscriptSegment>,
    view: LiveTranscriptView,
    live: Arc<watch::Sender<LiveTranscriptView>>,
    error: Option<RecognitionError>,
}

impl TranscriptReconciler {
    pub fn new(recording_id: String, live: Arc<watch::Sender<LiveTranscriptView>>) -> Self {
        live.send_replace(LiveTranscriptView::default());
        Self {
            recording_id,
            segments: Vec::new(),
            view: LiveTranscriptView::default(),
            live,
            error: None,
        }
    }

    /// Apply one event. Replaying an identical event sequence produces an
    /// identical transcript: finals that would overlap an already-committed
    /// range are discarded, not double-appended.
    pub fn apply(&mut self, event: HypothesisEvent) {
        match event {
            HypothesisEvent::Partial { text, .. } => {
                self.view.partial_text = text;
                self.publish();
            }
            HypothesisEvent::Final {
                text,
                start_ms,
                end_ms,
                is_question: engine_signal,
            } => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    // Nothing to commit, but the partial it supersedes is gone.
                    self.view.partial_text.clear();
                    self.publish();
                    return;
                }
                if end_ms < start_ms {
                    warn!(
                        "Discarding inverted final range [{}, {})",
                        start_ms, end_ms
                    );
                    return;
                }
                if let Some(last) = self.segments.last() {
                    if start_ms < last.end_ms {
                        warn!(
                            "Discarding final overlapping committed range: [{}, {}) vs last end {}",
                            start_ms, end_ms, last.end_ms
                        );
                        return;
                    }
                }

                let segment = TranscriptSegment {
                    id: uuid::Uuid::new_v4().to_string(),
                    recording_id: self.recording_id.clone(),
                    start_ms,
                    end_ms,
                    text: trimmed.to_string(),
                    is_question: is_question(trimmed, engine_signal),
                    speaker: None,
                };

                if !self.view.committed_text.is_empty() {
                    self.view.committed_text.push(' ');
                }
                self.view.committed_text.push_str(&segment.text);
                self.view.partial_text.clear();
                self.segments.push(segment);
                self.publish();
            }
            HypothesisEvent::Error(e) => {
                warn!("Recognition error reached reconciler: {}", e);
                self.error = Some(e);
            }
        }
    }

    fn publish(&self) {
        self.live.send_replace(self.view.clone());
    }

    /// Consume events until the channel closes. `on_error` fires for each
    /// recognition error so the session can surface a live warning.
    pub async fn run<F>(
        mut self,
        mut events: mpsc::Receiver<HypothesisEvent>,
        on_error: F,
    ) -> TranscriptOutcome
    where
        F: Fn(&RecognitionError) + Send,
    {
        while let Some(event) = events.recv().await {
            if let HypothesisEvent::Error(e) = &event {
                on_error(e);
            }
            self.apply(event);
        }
        self.into_outcome()
    }

    pub fn into_outcome(self) -> TranscriptOutcome {
        TranscriptOutcome {
            segments: self.segments,
            committed_text: self.view.committed_text,
            error: self.error,
        }
    }
}
