use super::{FlashcardRecord, NoteRecord, RecordingRecord, RecordingStore};
use crate::stt::TranscriptSegment;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory reference implementation of the storage boundary.
#[derive(Default)]
pub struct MemoryStore {
    recordings: RwLock<HashMap<String, RecordingRecord>>,
    segments: RwLock<HashMap<String, Vec<TranscriptSegment>>>,
    notes: RwLock<HashMap<String, Vec<NoteRecord>>>,
    flashcards: RwLock<HashMap<String, Vec<FlashcardRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordingStore for MemoryStore {
    async fn put_recording(&self, record: RecordingRecord) -> Result<()> {
        self.recordings
            .write()
            .await
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_recording(&self, id: &str) -> Result<Option<RecordingRecord>> {
        Ok(self.recordings.read().await.get(id).cloned())
    }

    async fn list_recordings(&self) -> Result<Vec<RecordingRecord>> {
        let mut all: Vec<_> = self.recordings.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn delete_recording(&self, id: &str) -> Result<()> {
        self.recordings.write().await.remove(id);
        // Cascade: children go with the parent.
        self.segments.write().await.remove(id);
        self.notes.write().await.remove(id);
        self.flashcards.write().await.remove(id);
        Ok(())
    }

    async fn put_segments(
        &self,
        recording_id: &str,
        segments: Vec<TranscriptSegment>,
    ) -> Result<()> {
        self.segments
            .write()
            .await
            .insert(recording_id.to_string(), segments);
        Ok(())
    }

    async fn segments_for(&self, recording_id: &str) -> Result<Vec<TranscriptSegment>> {
        Ok(self
            .segments
            .read()
            .await
            .get(recording_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_segments(&self, query: &str) -> Result<Vec<TranscriptSegment>> {
        let needle = query.to_lowercase();
        let segments = self.segments.read().await;
        Ok(segments
            .values()
            .flatten()
            .filter(|s| s.text.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn put_note(&self, note: NoteRecord) -> Result<()> {
        self.notes
            .write()
            .await
            .entry(note.recording_id.clone())
            .or_default()
            .push(note);
        Ok(())
    }

    async fn notes_for(&self, recording_id: &str) -> Result<Vec<NoteRecord>> {
        Ok(self
            .notes
            .read()
            .await
            .get(recording_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_flashcard(&self, card: FlashcardRecord) -> Result<()> {
        self.flashcards
            .write()
            .await
            .entry(card.recording_id.clone())
            .or_default()
            .push(card);
        Ok(())
    }

    async fn flashcards_for(&self, recording_id: &str) -> Result<Vec<FlashcardRecord>> {
        Ok(self
            .flashcards
            .read()
            .await
            .get(recording_id)
            .cloned()
            .unwrap_or_default())
    }
}
