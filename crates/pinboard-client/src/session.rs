//! Per-client UI state, passed explicitly to whoever renders the board.

use chrono::{DateTime, Utc};

use pinboard_shared::{NoteId, NoteView};

#[derive(Debug, Default)]
pub struct Session {
    editing: Option<NoteId>,
    notes: Vec<NoteView>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a note as being edited. Background refreshes pause until
    /// [`Session::end_edit`].
    pub fn begin_edit(&mut self, id: NoteId) {
        self.editing = Some(id);
    }

    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing(&self) -> Option<&NoteId> {
        self.editing.as_ref()
    }

    pub fn notes(&self) -> &[NoteView] {
        &self.notes
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn replace_notes(&mut self, notes: Vec<NoteView>) {
        self.notes = notes;
        self.refreshed_at = Some(Utc::now());
    }
}
