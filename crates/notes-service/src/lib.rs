//! Basic-auth protected CRUD service for notes
//!
//! Exposes create/list/get/update/delete over a single note collection:
//! - `POST /notes`
//! - `GET /notes`
//! - `GET /notes/{id}`
//! - `PUT /notes/{id}`
//! - `DELETE /notes/{id}`

pub mod auth;
pub mod config;
pub mod handlers;
pub mod note;
pub mod store;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::AuthConfig;
use crate::store::NoteStore;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn NoteStore>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn NoteStore>, auth: AuthConfig) -> Self {
        Self { store, auth }
    }
}

/// Build the application router with authentication applied to every route
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/notes", get(handlers::list).post(handlers::create))
        .route(
            "/notes/{id}",
            get(handlers::get)
                .put(handlers::update)
                .delete(handlers::delete),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
