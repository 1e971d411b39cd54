//! Durable-storage collaborator boundary.
//!
//! The core hands finished recordings to a `RecordingStore`; what backs it
//! (a database, files, a remote service) is not the core's concern. The
//! in-memory implementation serves tests and the demo binary.

pub mod memory;

use crate::stt::TranscriptSegment;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingRecord {
    pub id: String,
    pub title: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub recording_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardRecord {
    pub id: String,
    pub recording_id: String,
    pub front: String,
    pub back: String,
    /// 0 = easy .. 5 = hard.
    pub difficulty: u8,
}

/// Keyed read/write/delete/list-by-parent storage. Deleting a recording
/// cascades to its segments, notes, and flashcards.
#[async_trait]
pub trait RecordingStore: Send + Sync {
    async fn put_recording(&self, record: RecordingRecord) -> Result<()>;
    async fn get_recording(&self, id: &str) -> Result<Option<RecordingRecord>>;
    async fn list_recordings(&self) -> Result<Vec<RecordingRecord>>;
    async fn delete_recording(&self, id: &str) -> Result<()>;

    async fn put_segments(&self, recording_id: &str, segments: Vec<TranscriptSegment>)
        -> Result<()>;
    async fn segments_for(&self, recording_id: &str) -> Result<Vec<TranscriptSegment>>;
    /// Case-insensitive substring scan across committed segments. Index
    /// internals live elsewhere.
    async fn search_segments(&self, query: &str) -> Result<Vec<TranscriptSegment>>;

    async fn put_note(&self, note: NoteRecord) -> Result<()>;
    async fn notes_for(&self, recording_id: &str) -> Result<Vec<NoteRecord>>;

    async fn put_flashcard(&self, card: FlashcardRecord) -> Result<()>;
    async fn flashcards_for(&self, recording_id: &str) -> Result<Vec<FlashcardRecord>>;
}

pub use memory::MemoryStore;
