//! The note document, its identifier scheme, and field validation

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 1000;
pub const CONTENT_MIN_LEN: usize = 5;
pub const CONTENT_MAX_LEN: usize = 1000;

/// Length of a note ID in raw bytes
const ID_LEN: usize = 12;

/// A stored note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
}

/// Unique note identifier.
///
/// 12 bytes: 4-byte creation timestamp (seconds), 5 bytes fixed per generator,
/// 3-byte counter. Rendered as 24 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId([u8; ID_LEN]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid note id: {0:?}")]
pub struct IdError(pub String);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for NoteId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_LEN * 2 {
            return Err(IdError(s.to_string()));
        }
        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| IdError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for NoteId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hands out increasing, process-unique note IDs
pub struct IdGenerator {
    process: [u8; 5],
    counter: AtomicU32,
}

impl IdGenerator {
    pub fn new() -> Self {
        let mut rng = rand::rng();
        Self {
            process: rng.random(),
            counter: AtomicU32::new(rng.random_range(0..0x00ff_ffff)),
        }
    }

    pub fn next_id(&self) -> NoteId {
        let secs = Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; ID_LEN];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        NoteId(bytes)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// --- Validation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldErrorKind {
    Required,
    MinLength,
    MaxLength,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

/// Per-field validation failures, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Check title and content against the note schema
pub fn validate(title: &str, content: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_field(&mut errors, "title", "Title", title, TITLE_MIN_LEN, TITLE_MAX_LEN);
    check_field(
        &mut errors,
        "content",
        "Content",
        content,
        CONTENT_MIN_LEN,
        CONTENT_MAX_LEN,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_field(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    let error = if len == 0 {
        FieldError {
            kind: FieldErrorKind::Required,
            message: format!("{} is required", label),
        }
    } else if len < min {
        FieldError {
            kind: FieldErrorKind::MinLength,
            message: format!("{} must be at least {} characters", label, min),
        }
    } else if len > max {
        FieldError {
            kind: FieldErrorKind::MaxLength,
            message: format!("{} must be at most {} characters", label, max),
        }
    } else {
        return;
    };
    errors.0.insert(field, error);
}
