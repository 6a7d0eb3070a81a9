//! Periodic re-fetch of the board while nobody is editing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::session::Session;
use crate::sync::NoteSync;

pub type SharedSession = Arc<Mutex<Session>>;

/// Re-fetch every `interval` until the handle is aborted.
pub fn spawn_refresh(
    sync: Arc<NoteSync>,
    session: SharedSession,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; callers render the initial list themselves.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !refresh_once(&sync, &session).await {
                tracing::debug!("Refresh skipped");
            }
        }
    })
}

/// Fetch the list and store it in the session. Returns `false` when an edit
/// was in progress, before or after the fetch.
pub async fn refresh_once(sync: &NoteSync, session: &Mutex<Session>) -> bool {
    if editing(session) {
        return false;
    }

    let notes = sync.get_all_notes().await;

    let Ok(mut guard) = session.lock() else {
        tracing::warn!("Session lock poisoned, skipping refresh");
        return false;
    };
    // An edit may have started while the request was in flight.
    if guard.is_editing() {
        return false;
    }
    guard.replace_notes(notes);
    true
}

fn editing(session: &Mutex<Session>) -> bool {
    session.lock().map(|s| s.is_editing()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::WriteMode;
    use pinboard_shared::NoteId;
    use pinboard_store::Database;

    fn offline_sync() -> NoteSync {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        NoteSync::new(api, Database::open_in_memory().unwrap(), WriteMode::SharedOnly)
    }

    #[tokio::test]
    async fn test_refresh_skipped_while_editing() {
        let sync = offline_sync();
        let session = Mutex::new(Session::new());
        session.lock().unwrap().begin_edit(NoteId::from("n1"));

        assert!(!refresh_once(&sync, &session).await);
        assert!(session.lock().unwrap().refreshed_at().is_none());
    }

    #[tokio::test]
    async fn test_refresh_updates_session() {
        let sync = offline_sync();
        let session = Mutex::new(Session::new());

        assert!(refresh_once(&sync, &session).await);
        assert!(session.lock().unwrap().refreshed_at().is_some());
    }
}
