//! Edit tokens: the capability secret that authorises mutating a note.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::constants::EDIT_TOKEN_BYTES;

/// High-entropy secret bound to a note at creation.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditToken(String);

impl EditToken {
    /// Generate a fresh token from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; EDIT_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Constant-time comparison against a presented token.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        expected.len() == presented.len() && expected.ct_eq(presented).unwrap_u8() == 1
    }
}

impl From<String> for EditToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for EditToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EditToken(<redacted>)")
    }
}
