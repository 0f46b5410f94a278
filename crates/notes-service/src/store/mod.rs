//! Note storage trait and error types.

mod document;

pub use document::DocumentStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::note::{IdError, Note, ValidationErrors};

/// Errors returned by note store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Title or content violate the note schema
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The supplied string is not a well-formed note ID
    #[error(transparent)]
    InvalidId(#[from] IdError),

    /// No note with the given ID exists
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Reading or persisting the collection failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted collection could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Document collection holding notes.
///
/// IDs are passed as raw strings so that each backend decides what a
/// well-formed identifier is; malformed ones fail with `InvalidId`.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Validate and insert a new note under a freshly assigned ID.
    async fn create(&self, title: &str, content: &str) -> Result<Note>;

    /// Every stored note. Empty when the collection is empty.
    async fn list_all(&self) -> Result<Vec<Note>>;

    async fn get_by_id(&self, id: &str) -> Result<Note>;

    /// Replace title and content of an existing note, returning the updated record.
    async fn update_by_id(&self, id: &str, title: &str, content: &str) -> Result<Note>;

    /// Remove a note, returning the record as it was before deletion.
    async fn delete_by_id(&self, id: &str) -> Result<Note>;
}
