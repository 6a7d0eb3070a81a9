//! Note record, sanitized view and draft validation.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    IMAGE_DATA_URL_PREFIX, LOCAL_NOTE_PREFIX, MAX_CONTENT_CHARS, MAX_IMAGE_CHARS, NOTE_KEY_PREFIX,
};
use crate::error::ValidationError;
use crate::token::EditToken;

/// Current time as milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Opaque note identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub String);

impl NoteId {
    /// Fresh server-side id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Fresh id for a note that only exists on this client.
    pub fn generate_local() -> Self {
        Self(format!("{LOCAL_NOTE_PREFIX}{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_NOTE_PREFIX)
    }

    /// Key of this note's record in the blob store.
    pub fn store_key(&self) -> String {
        format!("{NOTE_KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Validated note payload, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub content: String,
    pub image_data_url: Option<String>,
}

impl NoteDraft {
    /// Trim and bound-check raw user input.
    ///
    /// Blank fields count as absent; at least one of the two must remain.
    pub fn new(content: Option<&str>, image_data_url: Option<&str>) -> Result<Self, ValidationError> {
        let content = content.map(str::trim).unwrap_or_default();
        let len = content.chars().count();
        if len > MAX_CONTENT_CHARS {
            return Err(ValidationError::ContentTooLong {
                len,
                max: MAX_CONTENT_CHARS,
            });
        }

        let image = image_data_url.map(str::trim).filter(|s| !s.is_empty());
        if let Some(image) = image {
            let len = image.chars().count();
            if len > MAX_IMAGE_CHARS {
                return Err(ValidationError::ImageTooLarge {
                    len,
                    max: MAX_IMAGE_CHARS,
                });
            }
            if !image.starts_with(IMAGE_DATA_URL_PREFIX) {
                return Err(ValidationError::InvalidImage);
            }
        }

        if content.is_empty() && image.is_none() {
            return Err(ValidationError::EmptyNote);
        }

        Ok(Self {
            content: content.to_string(),
            image_data_url: image.map(str::to_string),
        })
    }
}

/// A note as persisted by the server, edit token included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredNote {
    pub id: NoteId,
    pub content: String,
    pub image_data_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub edit_token: EditToken,
}

impl StoredNote {
    pub fn new(id: NoteId, draft: NoteDraft, edit_token: EditToken, now: i64) -> Self {
        Self {
            id,
            content: draft.content,
            image_data_url: draft.image_data_url,
            created_at: now,
            updated_at: now,
            edit_token,
        }
    }

    /// Replace content and image. `updated_at` always moves strictly forward,
    /// even when the clock has not ticked since the last write.
    pub fn apply(&mut self, draft: NoteDraft, now: i64) {
        self.content = draft.content;
        self.image_data_url = draft.image_data_url;
        self.updated_at = now.max(self.updated_at + 1);
    }

    /// Sanitized view with the edit token stripped.
    pub fn view(&self) -> NoteView {
        NoteView {
            id: self.id.clone(),
            content: self.content.clone(),
            image_data_url: self.image_data_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// The only note representation that leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: NoteId,
    pub content: String,
    #[serde(default)]
    pub image_data_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
