//! End-to-end tests: `NoteSync` against a real in-process server.

use std::path::Path;
use std::time::Duration;

use pinboard_client::{ApiClient, ClientError, NoteSync, WriteMode};
use pinboard_server::config::{ServerConfig, StoreBackend};
use pinboard_shared::NoteId;
use pinboard_store::Database;
use tokio::net::TcpListener;

async fn spawn_server() -> String {
    let config = ServerConfig {
        store_backend: StoreBackend::Memory,
        ..ServerConfig::default()
    };
    let state = pinboard_server::build_state(config).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(pinboard_server::api::serve_on(listener, state));
    format!("http://{addr}")
}

/// An address that refuses connections.
async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn sync_at(url: &str, db: &Path, mode: WriteMode) -> NoteSync {
    let api = ApiClient::new(url, Duration::from_secs(5)).unwrap();
    NoteSync::new(api, Database::open_at(db).unwrap(), mode)
}

#[tokio::test]
async fn test_create_update_delete_roundtrip() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let sync = sync_at(&url, &dir.path().join("a.db"), WriteMode::SharedOnly);

    let note = sync.create_note(Some("  Hello board  "), None).await.unwrap();
    assert_eq!(note.content, "Hello board");
    assert!(sync.can_edit(&note.id));

    let updated = sync
        .update_note(&note.id, Some("Edited"), None)
        .await
        .unwrap()
        .expect("token is held");
    assert_eq!(updated.content, "Edited");
    assert!(updated.updated_at > note.updated_at);

    let listed = sync.get_all_notes().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "Edited");

    assert!(sync.delete_note(&note.id).await.unwrap());
    assert!(!sync.can_edit(&note.id));
    assert!(sync.get_all_notes().await.is_empty());
}

#[tokio::test]
async fn test_other_clients_cannot_edit() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let owner = sync_at(&url, &dir.path().join("owner.db"), WriteMode::SharedOnly);
    let other = sync_at(&url, &dir.path().join("other.db"), WriteMode::SharedOnly);

    let note = owner.create_note(Some("mine"), None).await.unwrap();

    assert!(!other.can_edit(&note.id));
    assert!(other
        .update_note(&note.id, Some("theirs"), None)
        .await
        .unwrap()
        .is_none());
    assert!(!other.delete_note(&note.id).await.unwrap());

    let listed = other.get_all_notes().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "mine");
}

#[tokio::test]
async fn test_newest_activity_first() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let sync = sync_at(&url, &dir.path().join("a.db"), WriteMode::SharedOnly);

    let first = sync.create_note(Some("first"), None).await.unwrap();
    let second = sync.create_note(Some("second"), None).await.unwrap();

    let ids: Vec<NoteId> = sync.get_all_notes().await.into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);

    // Edits do not move a note in the list.
    sync.update_note(&first.id, Some("first, again"), None)
        .await
        .unwrap();
    let ids: Vec<NoteId> = sync.get_all_notes().await.into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_delete_succeeds_when_token_cleanup_fails() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("a.db");
    let sync = sync_at(&url, &db_path, WriteMode::SharedOnly);

    let note = sync.create_note(Some("doomed"), None).await.unwrap();

    let other = Database::open_at(&db_path).unwrap();
    other
        .conn()
        .execute_batch(
            "CREATE TRIGGER keep_tokens BEFORE DELETE ON edit_tokens
             BEGIN SELECT RAISE(ABORT, 'tokens are read-only'); END;",
        )
        .unwrap();
    drop(other);

    assert!(sync.delete_note(&note.id).await.unwrap());
    assert!(sync.get_all_notes().await.is_empty());
}

#[tokio::test]
async fn test_list_falls_back_to_cache() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shared.db");

    {
        let online = sync_at(&url, &db_path, WriteMode::SharedOnly);
        online.create_note(Some("cached"), None).await.unwrap();
        assert_eq!(online.get_all_notes().await.len(), 1);
    }

    let offline = sync_at(&dead_url().await, &db_path, WriteMode::SharedOnly);
    let notes = offline.get_all_notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].content, "cached");
}

#[tokio::test]
async fn test_list_offline_without_cache_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let sync = sync_at(&dead_url().await, &dir.path().join("a.db"), WriteMode::SharedOnly);
    assert!(sync.get_all_notes().await.is_empty());
}

#[tokio::test]
async fn test_validation_errors_surface_in_every_mode() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();

    for mode in [WriteMode::SharedOnly, WriteMode::LocalFallback] {
        let sync = sync_at(&url, &dir.path().join(format!("{mode:?}.db")), mode);
        let err = sync.create_note(Some("   "), None).await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(!message.is_empty());
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_update_with_invalid_content_raises() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let sync = sync_at(&url, &dir.path().join("a.db"), WriteMode::SharedOnly);

    let note = sync.create_note(Some("ok"), None).await.unwrap();
    let long = "x".repeat(2001);
    let err = sync
        .update_note(&note.id, Some(&long), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
}

#[tokio::test]
async fn test_offline_create_in_local_fallback_mode() {
    let dir = tempfile::tempdir().unwrap();
    let sync = sync_at(&dead_url().await, &dir.path().join("a.db"), WriteMode::LocalFallback);

    let note = sync.create_note(Some("offline"), None).await.unwrap();
    assert!(note.id.is_local());
    assert!(sync.can_edit(&note.id));

    let notes = sync.get_all_notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, note.id);
}

#[tokio::test]
async fn test_local_notes_listed_before_shared() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("a.db");

    let local = {
        let offline = sync_at(&dead_url().await, &db_path, WriteMode::LocalFallback);
        offline.create_note(Some("local"), None).await.unwrap()
    };

    let online = sync_at(&url, &db_path, WriteMode::LocalFallback);
    let shared = online.create_note(Some("shared"), None).await.unwrap();
    assert!(!shared.id.is_local());

    let ids: Vec<NoteId> = online.get_all_notes().await.into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![local.id, shared.id]);
}

#[tokio::test]
async fn test_request_timeout() {
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let api = ApiClient::new(&format!("http://{addr}"), Duration::from_millis(200)).unwrap();
    let sync = NoteSync::new(
        api,
        Database::open_at(&dir.path().join("a.db")).unwrap(),
        WriteMode::SharedOnly,
    );

    let err = sync.create_note(Some("slow"), None).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout));
    assert!(sync.get_all_notes().await.is_empty());
}
