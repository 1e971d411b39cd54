//! HTTP API server for external control
//!
//! This module provides a REST API for controlling recording sessions:
//! - POST /recordings/start|pause|resume|stop - Session control
//! - GET /recordings/status - Session status + live transcript
//! - GET /recordings, /recordings/:id/transcript - Library queries
//! - GET /model/status, POST /model/ensure - Model asset lifecycle
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
