//! The note cache: a single row holding the last list fetched from the server.
//!
//! The cache is always overwritten, never merged.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use pinboard_shared::NoteView;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Last cached list, or empty if nothing has been cached yet.
    pub fn cached_notes(&self) -> Result<Vec<NoteView>> {
        let json: Option<String> = self
            .conn()
            .query_row("SELECT json FROM note_cache WHERE id = 1", [], |row| row.get(0))
            .optional()?;

        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn replace_cached_notes(&self, notes: &[NoteView]) -> Result<()> {
        let json = serde_json::to_string(notes)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO note_cache (id, json, fetched_at) VALUES (1, ?1, ?2)",
            params![json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// When the cache was last replaced.
    pub fn cache_fetched_at(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn()
            .query_row("SELECT fetched_at FROM note_cache WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match raw {
            Some(s) => Ok(Some(DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_shared::NoteId;

    fn note(id: &str, content: &str) -> NoteView {
        NoteView {
            id: NoteId::from(id),
            content: content.to_string(),
            image_data_url: None,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn empty_cache_reads_as_empty_list() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.cached_notes().unwrap().is_empty());
        assert!(db.cache_fetched_at().unwrap().is_none());
    }

    #[test]
    fn replace_overwrites_instead_of_merging() {
        let db = Database::open_in_memory().unwrap();
        db.replace_cached_notes(&[note("a", "one"), note("b", "two")])
            .unwrap();
        db.replace_cached_notes(&[note("c", "three")]).unwrap();

        assert_eq!(db.cached_notes().unwrap(), vec![note("c", "three")]);
        assert!(db.cache_fetched_at().unwrap().is_some());
    }

    #[test]
    fn cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        Database::open_at(&path)
            .unwrap()
            .replace_cached_notes(&[note("a", "kept")])
            .unwrap();

        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.cached_notes().unwrap(), vec![note("a", "kept")]);
    }
}
