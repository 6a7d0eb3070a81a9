use thiserror::Error;

use pinboard_shared::ValidationError;
use pinboard_store::StoreError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Server responded {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from server: {0}")]
    Decode(String),

    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Local state lock poisoned")]
    LockPoisoned,
}

impl ClientError {
    /// The server could not be reached at all (as opposed to answering
    /// with an error).
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err)
        }
    }
}
