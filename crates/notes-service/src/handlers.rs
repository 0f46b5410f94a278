//! Note CRUD endpoints
//!
//! Each handler validates its input, makes a single store call, and maps the
//! outcome onto a status code and JSON body.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::note::{Note, ValidationErrors};
use crate::store::StoreError;
use crate::AppState;

/// Request body for create and update
#[derive(Debug, Default, Deserialize)]
pub struct NotePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl NotePayload {
    /// Title and content, if both are present and non-empty
    fn fields(&self) -> Option<(&str, &str)> {
        match (self.title.as_deref(), self.content.as_deref()) {
            (Some(title), Some(content)) if !title.is_empty() && !content.is_empty() => {
                Some((title, content))
            }
            _ => None,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationErrors>,
}

/// Failures a handler can answer with
#[derive(Debug)]
pub enum ApiError {
    MissingFields,
    Validation(ValidationErrors),
    InvalidId,
    NotFound,
    NoNotes,
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(errors) => ApiError::Validation(errors),
            StoreError::InvalidId(_) => ApiError::InvalidId,
            StoreError::NotFound(_) => ApiError::NotFound,
            err @ (StoreError::Io(_) | StoreError::Serialization(_)) => {
                tracing::error!("Store operation failed: {}", err);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::MissingFields => (
                StatusCode::BAD_REQUEST,
                "Title and content are required",
                None,
            ),
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, "Validation Error", Some(errors))
            }
            ApiError::InvalidId => (StatusCode::BAD_REQUEST, "Invalid note ID", None),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Note not found", None),
            ApiError::NoNotes => (StatusCode::NOT_FOUND, "No notes found", None),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                None,
            ),
        };

        let body = ErrorBody {
            error: error.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, treating any rejection as missing fields
fn read_payload(body: Result<Json<NotePayload>, JsonRejection>) -> NotePayload {
    match body {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::debug!("Unreadable note body: {}", rejection);
            NotePayload::default()
        }
    }
}

/// Handler for `POST /notes`
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NotePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let payload = read_payload(body);
    let (title, content) = payload.fields().ok_or(ApiError::MissingFields)?;

    let note = state.store.create(title, content).await?;
    tracing::info!("Created note {}", note.id);
    Ok((StatusCode::CREATED, Json(note)))
}

/// Handler for `GET /notes`
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.store.list_all().await?;
    if notes.is_empty() {
        return Err(ApiError::NoNotes);
    }
    Ok(Json(notes))
}

/// Handler for `GET /notes/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let note = state.store.get_by_id(&id).await?;
    Ok(Json(note))
}

/// Handler for `PUT /notes/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<NotePayload>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let payload = read_payload(body);
    let (title, content) = payload.fields().ok_or(ApiError::MissingFields)?;

    let note = state.store.update_by_id(&id, title, content).await?;
    tracing::info!("Updated note {}", note.id);
    Ok(Json(note))
}

/// Handler for `DELETE /notes/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let note = state.store.delete_by_id(&id).await?;
    tracing::info!("Deleted note {}", note.id);
    Ok(Json(note))
}
