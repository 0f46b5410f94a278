//! In-process document collection with optional JSON file persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use super::{NoteStore, Result, StoreError};
use crate::note::{self, IdGenerator, Note, NoteId};

const NOTES_FILE: &str = "notes.json";

/// Note collection kept in memory and, when opened on a directory,
/// rewritten to `notes.json` after every mutation.
pub struct DocumentStore {
    path: Option<PathBuf>,
    notes: RwLock<BTreeMap<NoteId, Note>>,
    ids: IdGenerator,
}

/// On-disk layout of `notes.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct NoteCollection {
    notes: Vec<Note>,
}

/// Undo record for a mutation whose persist failed
enum Revert {
    Remove(NoteId),
    Restore(Note),
}

impl DocumentStore {
    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            path: None,
            notes: RwLock::new(BTreeMap::new()),
            ids: IdGenerator::new(),
        }
    }

    /// Open (or create) a store persisted under `data_path`
    pub async fn open(data_path: impl AsRef<Path>) -> Result<Self> {
        let data_path = data_path.as_ref();
        fs::create_dir_all(data_path).await?;

        let path = data_path.join(NOTES_FILE);
        let mut notes = BTreeMap::new();
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let collection: NoteCollection = serde_json::from_str(&content)?;
                for note in collection.notes {
                    notes.insert(note.id, note);
                }
                tracing::info!("Loaded {} notes from {:?}", notes.len(), path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No notes file at {:?}, starting empty", path);
            }
            Err(e) => return Err(StoreError::from(e)),
        }

        Ok(Self {
            path: Some(path),
            notes: RwLock::new(notes),
            ids: IdGenerator::new(),
        })
    }

    fn parse_id(id: &str) -> Result<NoteId> {
        Ok(id.parse::<NoteId>()?)
    }

    /// Write the collection to disk, undoing `revert` on failure
    async fn persist(&self, notes: &mut BTreeMap<NoteId, Note>, revert: Revert) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let collection = NoteCollection {
            notes: notes.values().cloned().collect(),
        };
        let result = match serde_json::to_string_pretty(&collection) {
            Ok(content) => atomic_write(path, &content).await.map_err(StoreError::from),
            Err(e) => Err(StoreError::from(e)),
        };

        if let Err(e) = result {
            tracing::error!("Failed to persist notes to {:?}: {}", path, e);
            match revert {
                Revert::Remove(id) => {
                    notes.remove(&id);
                }
                Revert::Restore(note) => {
                    notes.insert(note.id, note);
                }
            }
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for DocumentStore {
    async fn create(&self, title: &str, content: &str) -> Result<Note> {
        note::validate(title, content).map_err(StoreError::Validation)?;

        let mut notes = self.notes.write().await;
        let mut id = self.ids.next_id();
        while notes.contains_key(&id) {
            id = self.ids.next_id();
        }

        let note = Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
        };
        notes.insert(id, note.clone());
        self.persist(&mut notes, Revert::Remove(id)).await?;

        tracing::debug!("Created note {}", id);
        Ok(note)
    }

    async fn list_all(&self) -> Result<Vec<Note>> {
        let notes = self.notes.read().await;
        Ok(notes.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Note> {
        let note_id = Self::parse_id(id)?;
        let notes = self.notes.read().await;
        notes
            .get(&note_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_by_id(&self, id: &str, title: &str, content: &str) -> Result<Note> {
        let note_id = Self::parse_id(id)?;
        note::validate(title, content).map_err(StoreError::Validation)?;

        let mut notes = self.notes.write().await;
        let Some(existing) = notes.get_mut(&note_id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let previous = existing.clone();
        existing.title = title.to_string();
        existing.content = content.to_string();
        let updated = existing.clone();
        self.persist(&mut notes, Revert::Restore(previous)).await?;

        tracing::debug!("Updated note {}", note_id);
        Ok(updated)
    }

    async fn delete_by_id(&self, id: &str) -> Result<Note> {
        let note_id = Self::parse_id(id)?;

        let mut notes = self.notes.write().await;
        let Some(removed) = notes.remove(&note_id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        self.persist(&mut notes, Revert::Restore(removed.clone())).await?;

        tracing::debug!("Deleted note {}", note_id);
        Ok(removed)
    }
}

/// Atomic write using temp file + rename.
async fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let suffix: [u8; 8] = rand::rng().random();
    let temp_path = path.with_extension(format!("{}.tmp", hex::encode(suffix)));

    if let Err(e) = fs::write(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(())
}
