use super::state::AppState;
use crate::error::SessionError;
use crate::session::FinishedRecording;
use crate::store::RecordingRecord;
use crate::stt::TranscriptSegment;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub recording_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub status: String,
    pub recording: FinishedRecording,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub is_recording: bool,
    pub is_paused: bool,
    pub elapsed_ms: u64,
    pub committed_text: String,
    pub partial_text: String,
    pub model_ready: bool,
    pub model_progress: u8,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub recording_id: String,
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub ready: bool,
    pub progress: u8,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn session_error_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::AlreadyRecording
        | SessionError::NotRecording
        | SessionError::InvalidTransition(_) => StatusCode::CONFLICT,
        SessionError::Capture(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn session_error_response(e: SessionError) -> axum::response::Response {
    (
        session_error_status(&e),
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// POST /recordings/start
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.start(&state.recordings_dir).await {
        Ok(recording_id) => {
            info!("Recording started: {}", recording_id);
            (
                StatusCode::OK,
                Json(StartRecordingResponse {
                    recording_id,
                    status: "recording".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to start recording: {}", e);
            session_error_response(e)
        }
    }
}

/// POST /recordings/pause
pub async fn pause_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.pause().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "paused" })),
        )
            .into_response(),
        Err(e) => session_error_response(e),
    }
}

/// POST /recordings/resume
pub async fn resume_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.resume().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "recording" })),
        )
            .into_response(),
        Err(e) => session_error_response(e),
    }
}

/// POST /recordings/stop
///
/// Stops the session, persists the descriptor and its segments, and returns
/// the descriptor to the caller (the notification layer gets only this).
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    let finished = match state.controller.stop().await {
        Ok(finished) => finished,
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            return session_error_response(e);
        }
    };

    let record = RecordingRecord {
        id: finished.recording_id.clone(),
        title: auto_title(&finished),
        file_path: finished.file_path.display().to_string(),
        created_at: chrono::Utc::now(),
        duration_ms: finished.duration_ms,
    };

    if let Err(e) = state.store.put_recording(record).await {
        error!("Failed to persist recording: {}", e);
    }
    if let Err(e) = state
        .store
        .put_segments(&finished.recording_id, finished.segments.clone())
        .await
    {
        error!("Failed to persist segments: {}", e);
    }

    info!("Recording stopped: {}", finished.recording_id);
    (
        StatusCode::OK,
        Json(StopRecordingResponse {
            status: "stopped".to_string(),
            recording: finished,
        }),
    )
        .into_response()
}

/// GET /recordings/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let recording_state = state.controller.state().borrow().clone();
    let live = state.controller.live().borrow().clone();
    let is_paused = recording_state
        .as_active()
        .map(|a| a.is_paused)
        .unwrap_or(false);

    (
        StatusCode::OK,
        Json(StatusResponse {
            is_recording: recording_state.is_recording(),
            is_paused,
            elapsed_ms: state.controller.elapsed_ms(),
            committed_text: live.committed_text,
            partial_text: live.partial_text,
            model_ready: state.model.is_ready(),
            model_progress: *state.model.progress().borrow(),
        }),
    )
}

/// GET /recordings
pub async fn list_recordings(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_recordings().await {
        Ok(recordings) => (StatusCode::OK, Json(recordings)).into_response(),
        Err(e) => {
            error!("Failed to list recordings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /recordings/:recording_id/transcript
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(recording_id): Path<String>,
) -> impl IntoResponse {
    match state.store.segments_for(&recording_id).await {
        Ok(segments) => (
            StatusCode::OK,
            Json(TranscriptResponse {
                recording_id,
                segments,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to load transcript: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /model/status
pub async fn model_status(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ModelStatusResponse {
            ready: state.model.is_ready(),
            progress: *state.model.progress().borrow(),
        }),
    )
}

/// POST /model/ensure
///
/// Kicks the download in the background; progress is observable via
/// GET /model/status.
pub async fn model_ensure(State(state): State<AppState>) -> impl IntoResponse {
    if state.model.is_ready() {
        return (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready" })),
        );
    }

    let model = state.model.clone();
    tokio::spawn(async move {
        if let Err(e) = model.ensure_ready().await {
            error!("Model download failed: {}", e);
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "downloading" })),
    )
}

/// First few words of the transcript, or a dated fallback.
fn auto_title(finished: &FinishedRecording) -> String {
    let words: Vec<&str> = finished.transcript.split_whitespace().take(6).collect();
    if words.is_empty() {
        format!(
            "Recording {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M")
        )
    } else {
        words.join(" ")
    }
}
