use crate::model::ModelAssetManager;
use crate::session::RecordingController;
use crate::store::RecordingStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one recording controller for this process.
    pub controller: Arc<RecordingController>,
    pub model: Arc<ModelAssetManager>,
    pub store: Arc<dyn RecordingStore>,
    /// Where new recordings land.
    pub recordings_dir: PathBuf,
}
