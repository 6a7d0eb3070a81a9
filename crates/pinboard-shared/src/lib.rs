//! # pinboard-shared
//!
//! Types shared by the Pinboard server and client: the persisted note
//! record, its sanitized view, draft validation, edit tokens and the JSON
//! request/response bodies of the notes API.

pub mod constants;
pub mod error;
pub mod note;
pub mod protocol;
pub mod token;

pub use error::ValidationError;
pub use note::{now_millis, NoteDraft, NoteId, NoteView, StoredNote};
pub use token::EditToken;
