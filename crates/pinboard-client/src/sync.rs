//! The sync layer presentation code talks to.
//!
//! Reads never fail: a failed fetch falls back to the last cached list.
//! Writes go to the server and are gated on the locally held edit token.

use std::sync::Mutex;

use pinboard_shared::{now_millis, NoteDraft, NoteId, NoteView};
use pinboard_store::Database;

use crate::api::ApiClient;
use crate::config::{ClientConfig, WriteMode};
use crate::error::ClientError;

pub struct NoteSync {
    api: ApiClient,
    // rusqlite connections are not Sync. Never held across an await.
    db: Mutex<Database>,
    mode: WriteMode,
}

impl NoteSync {
    pub fn new(api: ApiClient, db: Database, mode: WriteMode) -> Self {
        Self {
            api,
            db: Mutex::new(db),
            mode,
        }
    }

    /// Build the HTTP client and open the local database described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config.server_url, config.timeout)?;
        let db = match &config.db_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        Ok(Self::new(api, db, config.write_mode))
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    fn with_db<T>(
        &self,
        f: impl FnOnce(&Database) -> pinboard_store::Result<T>,
    ) -> Result<T, ClientError> {
        let db = self.db.lock().map_err(|_| ClientError::LockPoisoned)?;
        Ok(f(&db)?)
    }

    fn local_mode(&self) -> bool {
        self.mode == WriteMode::LocalFallback
    }

    /// Current list of notes, newest activity first.
    ///
    /// Falls back to the cached list (or nothing) on any failure.
    pub async fn get_all_notes(&self) -> Vec<NoteView> {
        let shared = match self.api.list_notes().await {
            Ok(notes) => {
                if let Err(e) = self.with_db(|db| db.replace_cached_notes(&notes)) {
                    tracing::warn!(error = %e, "Failed to update note cache");
                }
                notes
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fetching notes failed, using cache");
                self.with_db(|db| db.cached_notes()).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Reading note cache failed");
                    Vec::new()
                })
            }
        };

        if !self.local_mode() {
            return shared;
        }

        let mut notes = self.with_db(|db| db.list_local_notes()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Reading local notes failed");
            Vec::new()
        });
        notes.extend(shared);
        notes
    }

    pub async fn create_note(
        &self,
        content: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<NoteView, ClientError> {
        match self.api.create_note(content, image_data_url).await {
            Ok((note, token)) => {
                if let Err(e) = self.with_db(|db| db.save_edit_token(&note.id, &token)) {
                    tracing::warn!(id = %note.id, error = %e, "Failed to save edit token");
                }
                tracing::info!(id = %note.id, "Note created");
                Ok(note)
            }
            Err(e) if e.is_transport() && self.local_mode() => {
                tracing::warn!(error = %e, "Server unreachable, keeping note locally");
                self.create_local(content, image_data_url)
            }
            Err(e) => Err(e),
        }
    }

    fn create_local(
        &self,
        content: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<NoteView, ClientError> {
        let draft = NoteDraft::new(content, image_data_url)?;
        let now = now_millis();
        let note = NoteView {
            id: NoteId::generate_local(),
            content: draft.content,
            image_data_url: draft.image_data_url,
            created_at: now,
            updated_at: now,
        };
        self.with_db(|db| db.insert_local_note(&note))?;
        tracing::info!(id = %note.id, "Local note created");
        Ok(note)
    }

    /// `Ok(None)` means this client holds no right to edit the note and no
    /// request was made.
    pub async fn update_note(
        &self,
        id: &NoteId,
        content: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<Option<NoteView>, ClientError> {
        if self.local_mode() && id.is_local() {
            return self.update_local(id, content, image_data_url);
        }

        let Some(token) = self.with_db(|db| db.edit_token(id))? else {
            tracing::debug!(%id, "No edit token held, skipping update");
            return Ok(None);
        };

        let note = self
            .api
            .update_note(id, &token, content, image_data_url)
            .await?;
        tracing::info!(%id, "Note updated");
        Ok(Some(note))
    }

    fn update_local(
        &self,
        id: &NoteId,
        content: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<Option<NoteView>, ClientError> {
        let Some(mut note) = self.with_db(|db| db.get_local_note(id))? else {
            return Ok(None);
        };

        let draft = NoteDraft::new(content, image_data_url)?;
        note.content = draft.content;
        note.image_data_url = draft.image_data_url;
        note.updated_at = now_millis().max(note.updated_at + 1);

        if !self.with_db(|db| db.update_local_note(&note))? {
            return Ok(None);
        }
        Ok(Some(note))
    }

    /// `Ok(false)` means no token was held and no request was made.
    pub async fn delete_note(&self, id: &NoteId) -> Result<bool, ClientError> {
        if self.local_mode() && id.is_local() {
            return self.with_db(|db| db.delete_local_note(id));
        }

        let Some(token) = self.with_db(|db| db.edit_token(id))? else {
            tracing::debug!(%id, "No edit token held, skipping delete");
            return Ok(false);
        };

        self.api.delete_note(id, &token).await?;
        if let Err(e) = self.with_db(|db| db.remove_edit_token(id)) {
            tracing::warn!(%id, error = %e, "Failed to drop edit token of deleted note");
        }
        tracing::info!(%id, "Note deleted");
        Ok(true)
    }

    /// Whether this client may edit the note. Never touches the network.
    pub fn can_edit(&self, id: &NoteId) -> bool {
        let result = self.with_db(|db| {
            if db.has_edit_token(id)? {
                return Ok(true);
            }
            if self.local_mode() && id.is_local() {
                return Ok(db.get_local_note(id)?.is_some());
            }
            Ok(false)
        });

        result.unwrap_or_else(|e| {
            tracing::warn!(%id, error = %e, "Edit token lookup failed");
            false
        })
    }
}
