//! The edit token map: note id -> token this client received at creation.
//!
//! Holding a token is the only local record of ownership. Losing it
//! permanently revokes this client's ability to edit the note.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use pinboard_shared::NoteId;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    pub fn edit_token(&self, id: &NoteId) -> Result<Option<String>> {
        self.conn()
            .query_row(
                "SELECT token FROM edit_tokens WHERE note_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    pub fn has_edit_token(&self, id: &NoteId) -> Result<bool> {
        Ok(self.edit_token(id)?.is_some())
    }

    pub fn save_edit_token(&self, id: &NoteId, token: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO edit_tokens (note_id, token, created_at) VALUES (?1, ?2, ?3)",
            params![id.as_str(), token, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Returns `true` if a token was removed.
    pub fn remove_edit_token(&self, id: &NoteId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM edit_tokens WHERE note_id = ?1",
            params![id.as_str()],
        )?;
        Ok(affected > 0)
    }

    pub fn edit_tokens(&self) -> Result<HashMap<NoteId, String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT note_id, token FROM edit_tokens")?;
        let rows = stmt.query_map([], |row| {
            Ok((NoteId::from(row.get::<_, String>(0)?), row.get::<_, String>(1)?))
        })?;
        rows.collect::<std::result::Result<HashMap<_, _>, _>>()
            .map_err(StoreError::Sqlite)
    }
}
