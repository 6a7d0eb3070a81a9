//! v001 -- Initial schema creation.
//!
//! Creates `note_cache`, `edit_tokens` and `local_notes`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Last successfully fetched note list (single row, JSON array)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS note_cache (
    id         INTEGER PRIMARY KEY CHECK (id = 1),
    json       TEXT NOT NULL,
    fetched_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Edit tokens received when this client created a note
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS edit_tokens (
    note_id    TEXT PRIMARY KEY NOT NULL,
    token      TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Notes created while offline (local-fallback mode only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS local_notes (
    id             TEXT PRIMARY KEY NOT NULL, -- always "local-" prefixed
    content        TEXT NOT NULL,
    image_data_url TEXT,
    created_at     INTEGER NOT NULL,          -- unix millis
    updated_at     INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_local_notes_created ON local_notes(created_at DESC);
"#;

/// Apply the v001 migration.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
