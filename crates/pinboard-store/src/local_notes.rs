use rusqlite::{params, OptionalExtension};

use pinboard_shared::{NoteId, NoteView};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    pub fn insert_local_note(&self, note: &NoteView) -> Result<()> {
        self.conn().execute(
            "INSERT INTO local_notes (id, content, image_data_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                note.id.as_str(),
                note.content,
                note.image_data_url,
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_local_note(&self, id: &NoteId) -> Result<Option<NoteView>> {
        self.conn()
            .query_row(
                "SELECT id, content, image_data_url, created_at, updated_at
                 FROM local_notes
                 WHERE id = ?1",
                params![id.as_str()],
                row_to_note,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    /// Most recently created first.
    pub fn list_local_notes(&self) -> Result<Vec<NoteView>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, content, image_data_url, created_at, updated_at
             FROM local_notes
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], row_to_note)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Returns `false` if no such local note exists.
    pub fn update_local_note(&self, note: &NoteView) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE local_notes SET content = ?2, image_data_url = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                note.id.as_str(),
                note.content,
                note.image_data_url,
                note.updated_at,
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn delete_local_note(&self, id: &NoteId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM local_notes WHERE id = ?1", params![id.as_str()])?;
        Ok(affected > 0)
    }
}

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteView> {
    Ok(NoteView {
        id: NoteId::from(row.get::<_, String>(0)?),
        content: row.get(1)?,
        image_data_url: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
