use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route("/recordings/start", post(handlers::start_recording))
        .route("/recordings/pause", post(handlers::pause_recording))
        .route("/recordings/resume", post(handlers::resume_recording))
        .route("/recordings/stop", post(handlers::stop_recording))
        // Session status + live transcript
        .route("/recordings/status", get(handlers::get_status))
        // Library queries
        .route("/recordings", get(handlers::list_recordings))
        .route(
            "/recordings/:recording_id/transcript",
            get(handlers::get_transcript),
        )
        // Model asset lifecycle
        .route("/model/status", get(handlers::model_status))
        .route("/model/ensure", post(handlers::model_ensure))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
