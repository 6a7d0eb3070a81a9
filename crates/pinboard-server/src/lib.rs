//! # pinboard-server
//!
//! HTTP API for a small shared note board.
//!
//! - **Note repository** mapping note CRUD onto an opaque key-value store,
//!   with a capped recency index and edit-token ownership
//! - **REST API** (axum) translating HTTP verbs to repository calls and
//!   repository outcomes to status codes
//! - **Store adapters**: in-memory and one-file-per-key on disk

pub mod api;
pub mod config;
pub mod error;
pub mod kv_store;
pub mod repository;

use std::sync::Arc;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::repository::NoteRepository;

/// Open the configured store and wire up the application state.
pub async fn build_state(config: ServerConfig) -> Result<AppState, kv_store::StoreError> {
    let store = kv_store::open(&config).await?;
    let repository = NoteRepository::new(store, config.list_limit, config.index_cap);

    Ok(AppState {
        repository: Arc::new(repository),
        config: Arc::new(config),
    })
}
