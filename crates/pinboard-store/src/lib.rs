//! # pinboard-store
//!
//! Client-local persistence for Pinboard, backed by SQLite.
//!
//! Everything here is a best-effort mirror of server state: the last note
//! list fetched successfully, the edit tokens this client received when it
//! created notes, and notes created while offline in local-fallback mode.
//! The crate exposes a synchronous `Database` handle wrapping a
//! `rusqlite::Connection` with typed helpers for each of those.

pub mod cache;
pub mod database;
pub mod local_notes;
pub mod migrations;
pub mod tokens;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
