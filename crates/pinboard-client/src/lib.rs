//! # pinboard-client
//!
//! Client-side sync layer for Pinboard.
//!
//! [`NoteSync`] gives presentation code one async CRUD interface. It hides
//! network failure behind a local cache and ownership behind a local edit
//! token map. [`Session`] holds the per-client UI state that the background
//! refresh loop consults.

pub mod api;
pub mod config;
pub mod error;
pub mod refresh;
pub mod session;
pub mod sync;

pub use api::ApiClient;
pub use config::{ClientConfig, WriteMode};
pub use error::ClientError;
pub use refresh::{refresh_once, spawn_refresh, SharedSession};
pub use session::Session;
pub use sync::NoteSync;
