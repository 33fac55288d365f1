use serde::Deserialize;

/// Body for note create and update; content is trimmed before storage.
#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub content: String,
}
