//! Note repository: maps note CRUD onto store keys and keeps the recency
//! index in step with the note records.
//!
//! Store layout:
//! - `note:<id>`: one JSON [`StoredNote`] per note
//! - `notes:index`: JSON array of ids, most recent first
//!
//! The note write and the index write are separate store operations. A
//! crash between them, or two writers racing on the index, can lose or
//! resurrect an index entry; the last index write wins.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use pinboard_shared::constants::{INDEX_KEY, MAX_NOTE_ID_LEN};
use pinboard_shared::{now_millis, EditToken, NoteDraft, NoteId, NoteView, StoredNote, ValidationError};

use crate::kv_store::{KvStore, StoreError};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Note not found: {0}")]
    NotFound(NoteId),

    #[error("Edit token does not match note {0}")]
    Forbidden(NoteId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Corrupt record '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub struct NoteRepository {
    store: Arc<dyn KvStore>,
    list_limit: usize,
    index_cap: usize,
}

impl NoteRepository {
    pub fn new(store: Arc<dyn KvStore>, list_limit: usize, index_cap: usize) -> Self {
        Self {
            store,
            list_limit,
            index_cap,
        }
    }

    /// The most recent notes, in index order, with tokens stripped.
    ///
    /// Never fails: ids whose record is missing or unreadable are skipped,
    /// and an unreadable index yields an empty list.
    pub async fn list(&self) -> Vec<NoteView> {
        let index = match self.read_index().await {
            Ok(index) => index,
            Err(e) => {
                error!(error = %e, "Failed to read note index");
                return Vec::new();
            }
        };

        let mut notes = Vec::with_capacity(index.len().min(self.list_limit));
        for id in index.iter().take(self.list_limit) {
            match self.load(id).await {
                Ok(Some(note)) => notes.push(note.view()),
                Ok(None) => debug!(id = %id, "Indexed note is missing, skipping"),
                Err(e) => warn!(id = %id, error = %e, "Skipping unreadable note"),
            }
        }
        notes
    }

    pub async fn get(&self, id: &NoteId) -> Result<NoteView, RepoError> {
        self.load(id)
            .await?
            .map(|note| note.view())
            .ok_or_else(|| RepoError::NotFound(id.clone()))
    }

    /// Create a note. The token is handed out here and nowhere else.
    pub async fn create(
        &self,
        content: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<(NoteView, EditToken), RepoError> {
        let draft = NoteDraft::new(content, image_data_url)?;
        let token = EditToken::generate();
        let note = StoredNote::new(NoteId::generate(), draft, token.clone(), now_millis());

        self.insert(&note).await?;

        info!(
            id = %note.id,
            content_chars = note.content.chars().count(),
            has_image = note.image_data_url.is_some(),
            "Note created"
        );
        Ok((note.view(), token))
    }

    pub async fn update(
        &self,
        id: &NoteId,
        token: &str,
        content: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<NoteView, RepoError> {
        let mut note = self
            .load(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(id.clone()))?;

        if !note.edit_token.matches(token) {
            warn!(id = %id, "Rejected update with wrong edit token");
            return Err(RepoError::Forbidden(id.clone()));
        }

        let draft = NoteDraft::new(content, image_data_url)?;
        note.apply(draft, now_millis());
        self.write_json(&id.store_key(), &note).await?;

        info!(id = %id, updated_at = note.updated_at, "Note updated");
        Ok(note.view())
    }

    /// Delete a note. Deleting a note that does not exist succeeds.
    pub async fn delete(&self, id: &NoteId, token: &str) -> Result<(), RepoError> {
        let Some(note) = self.load(id).await? else {
            debug!(id = %id, "Delete of unknown note, nothing to do");
            return Ok(());
        };

        if !note.edit_token.matches(token) {
            warn!(id = %id, "Rejected delete with wrong edit token");
            return Err(RepoError::Forbidden(id.clone()));
        }

        self.store.delete(&id.store_key()).await?;

        let mut index = self.read_index().await?;
        let before = index.len();
        index.retain(|entry| entry != id);
        if index.len() != before {
            self.write_json(INDEX_KEY, &index).await?;
        }

        info!(id = %id, "Note deleted");
        Ok(())
    }

    /// Write the note record, then promote its id in the index.
    async fn insert(&self, note: &StoredNote) -> Result<(), RepoError> {
        self.write_json(&note.id.store_key(), note).await?;

        let mut index = self.read_index().await?;
        promote(&mut index, note.id.clone(), self.index_cap);
        self.write_json(INDEX_KEY, &index).await
    }

    async fn load(&self, id: &NoteId) -> Result<Option<StoredNote>, RepoError> {
        // Longer ids are never issued, so there is nothing to look up.
        if id.as_str().is_empty() || id.as_str().len() > MAX_NOTE_ID_LEN {
            return Ok(None);
        }
        self.read_json(&id.store_key()).await
    }

    async fn read_index(&self) -> Result<Vec<NoteId>, RepoError> {
        Ok(self.read_json(INDEX_KEY).await?.unwrap_or_default())
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RepoError> {
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| RepoError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), RepoError> {
        let bytes = serde_json::to_vec(value).map_err(|source| RepoError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, bytes).await?;
        Ok(())
    }
}

/// Move `id` to the front of the index, dropping any earlier occurrence,
/// and truncate to `cap` entries.
fn promote(index: &mut Vec<NoteId>, id: NoteId, cap: usize) {
    index.retain(|entry| *entry != id);
    index.insert(0, id);
    index.truncate(cap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv_store::MemoryKvStore;
    use pinboard_shared::constants::{LIST_PAGE_SIZE, MAX_CONTENT_CHARS, MAX_INDEX_LEN};

    fn repo_with(list_limit: usize, index_cap: usize) -> (NoteRepository, Arc<MemoryKvStore>) {
        let store = Arc::new(MemoryKvStore::new());
        let repo = NoteRepository::new(store.clone(), list_limit, index_cap);
        (repo, store)
    }

    fn repo() -> NoteRepository {
        repo_with(LIST_PAGE_SIZE, MAX_INDEX_LEN).0
    }

    async fn stored_index(store: &MemoryKvStore) -> Vec<NoteId> {
        let bytes = store.get(INDEX_KEY).await.unwrap().unwrap_or_default();
        if bytes.is_empty() {
            return Vec::new();
        }
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let repo = repo();
        let (note, token) = repo.create(Some("  hi  "), None).await.unwrap();

        assert_eq!(note.content, "hi");
        assert_eq!(note.image_data_url, None);
        assert_eq!(note.created_at, note.updated_at);
        assert!(!token.as_str().is_empty());

        let listed = repo.list().await;
        assert_eq!(listed, vec![note]);
    }

    #[tokio::test]
    async fn test_create_with_image_only() {
        let repo = repo();
        let image = "data:image/png;base64,iVBORw0KGgo=";
        let (note, _) = repo.create(None, Some(image)).await.unwrap();
        assert_eq!(note.content, "");
        assert_eq!(note.image_data_url.as_deref(), Some(image));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_drafts() {
        let repo = repo();
        assert!(matches!(
            repo.create(Some("  "), None).await,
            Err(RepoError::Validation(ValidationError::EmptyNote))
        ));

        let long = "x".repeat(MAX_CONTENT_CHARS + 1);
        assert!(matches!(
            repo.create(Some(&long), None).await,
            Err(RepoError::Validation(ValidationError::ContentTooLong { .. }))
        ));

        assert!(repo.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let repo = repo();
        let (first, _) = repo.create(Some("first"), None).await.unwrap();
        let (second, _) = repo.create(Some("second"), None).await.unwrap();

        let ids: Vec<_> = repo.list().await.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_list_respects_page_size() {
        let (repo, _) = repo_with(2, 10);
        for i in 0..4 {
            repo.create(Some(&format!("note {i}")), None).await.unwrap();
        }
        let listed = repo.list().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "note 3");
    }

    #[tokio::test]
    async fn test_index_never_exceeds_cap() {
        let (repo, store) = repo_with(10, 3);
        for i in 0..7 {
            repo.create(Some(&format!("note {i}")), None).await.unwrap();
            assert!(stored_index(&store).await.len() <= 3);
        }
        let contents: Vec<_> = repo.list().await.into_iter().map(|n| n.content).collect();
        assert_eq!(contents, vec!["note 6", "note 5", "note 4"]);
    }

    #[tokio::test]
    async fn test_reinserting_existing_id_moves_it_to_front() {
        let (repo, store) = repo_with(10, 10);
        let (a, _) = repo.create(Some("a"), None).await.unwrap();
        let (b, _) = repo.create(Some("b"), None).await.unwrap();

        let forced = StoredNote::new(
            a.id.clone(),
            NoteDraft::new(Some("a again"), None).unwrap(),
            EditToken::generate(),
            now_millis(),
        );
        repo.insert(&forced).await.unwrap();

        assert_eq!(stored_index(&store).await, vec![a.id, b.id]);
    }

    #[test]
    fn test_promote() {
        let mut index: Vec<NoteId> = vec!["a".into(), "b".into(), "c".into()];
        promote(&mut index, "c".into(), 3);
        assert_eq!(index, vec![NoteId::from("c"), "a".into(), "b".into()]);

        promote(&mut index, "d".into(), 3);
        assert_eq!(index, vec![NoteId::from("d"), "c".into(), "a".into()]);
    }

    #[tokio::test]
    async fn test_list_skips_missing_and_corrupt_notes() {
        let (repo, store) = repo_with(10, 10);
        let (kept, _) = repo.create(Some("kept"), None).await.unwrap();
        let (gone, _) = repo.create(Some("gone"), None).await.unwrap();
        let (broken, _) = repo.create(Some("broken"), None).await.unwrap();

        store.delete(&gone.id.store_key()).await.unwrap();
        store
            .set(&broken.id.store_key(), b"{not json".to_vec())
            .await
            .unwrap();

        assert_eq!(repo.list().await, vec![kept]);
    }

    #[tokio::test]
    async fn test_list_with_corrupt_index_is_empty() {
        let (repo, store) = repo_with(10, 10);
        repo.create(Some("x"), None).await.unwrap();
        store.set(INDEX_KEY, b"garbage".to_vec()).await.unwrap();
        assert!(repo.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_with_correct_token() {
        let repo = repo();
        let (note, token) = repo.create(Some("hi"), None).await.unwrap();

        let updated = repo
            .update(&note.id, token.as_str(), Some("bye"), None)
            .await
            .unwrap();

        assert_eq!(updated.id, note.id);
        assert_eq!(updated.content, "bye");
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(repo.get(&note.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_preserves_token() {
        let repo = repo();
        let (note, token) = repo.create(Some("one"), None).await.unwrap();
        repo.update(&note.id, token.as_str(), Some("two"), None)
            .await
            .unwrap();
        // the original token still works after an update
        let again = repo
            .update(&note.id, token.as_str(), Some("three"), None)
            .await
            .unwrap();
        assert_eq!(again.content, "three");
    }

    #[tokio::test]
    async fn test_update_with_wrong_token_leaves_note_unchanged() {
        let repo = repo();
        let (note, _) = repo.create(Some("hi"), None).await.unwrap();

        let result = repo.update(&note.id, "wrong", Some("x"), None).await;
        assert!(matches!(result, Err(RepoError::Forbidden(_))));
        assert_eq!(repo.get(&note.id).await.unwrap(), note);
    }

    #[tokio::test]
    async fn test_update_unknown_note() {
        let repo = repo();
        let result = repo
            .update(&NoteId::from("missing"), "token", Some("x"), None)
            .await;
        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_validates_content() {
        let repo = repo();
        let (note, token) = repo.create(Some("hi"), None).await.unwrap();

        let at_limit = "y".repeat(MAX_CONTENT_CHARS);
        assert!(repo
            .update(&note.id, token.as_str(), Some(&at_limit), None)
            .await
            .is_ok());

        let over = "y".repeat(MAX_CONTENT_CHARS + 1);
        assert!(matches!(
            repo.update(&note.id, token.as_str(), Some(&over), None).await,
            Err(RepoError::Validation(ValidationError::ContentTooLong { .. }))
        ));
        assert!(matches!(
            repo.update(&note.id, token.as_str(), Some(""), None).await,
            Err(RepoError::Validation(ValidationError::EmptyNote))
        ));
    }

    #[tokio::test]
    async fn test_delete_with_wrong_token() {
        let repo = repo();
        let (note, _) = repo.create(Some("hi"), None).await.unwrap();

        assert!(matches!(
            repo.delete(&note.id, "wrong").await,
            Err(RepoError::Forbidden(_))
        ));
        assert_eq!(repo.list().await, vec![note]);
    }

    #[tokio::test]
    async fn test_delete_with_correct_token() {
        let (repo, store) = repo_with(10, 10);
        let (note, token) = repo.create(Some("hi"), None).await.unwrap();

        repo.delete(&note.id, token.as_str()).await.unwrap();

        assert!(repo.list().await.is_empty());
        assert!(stored_index(&store).await.is_empty());
        assert!(matches!(
            repo.get(&note.id).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_note_is_idempotent() {
        let repo = repo();
        repo.delete(&NoteId::from("never-existed"), "anything")
            .await
            .unwrap();

        let (note, token) = repo.create(Some("hi"), None).await.unwrap();
        repo.delete(&note.id, token.as_str()).await.unwrap();
        repo.delete(&note.id, token.as_str()).await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_ids_are_not_found() {
        let repo = repo();
        let id = NoteId::from("z".repeat(MAX_NOTE_ID_LEN + 1));
        assert!(matches!(repo.get(&id).await, Err(RepoError::NotFound(_))));
        repo.delete(&id, "t").await.unwrap();
    }
}
