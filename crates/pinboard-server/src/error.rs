use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use pinboard_shared::protocol::ErrorResponse;
use pinboard_shared::ValidationError;

use crate::repository::RepoError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for ServerError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Validation(e) => ServerError::Validation(e),
            RepoError::NotFound(id) => ServerError::NotFound(format!("no note with id {id}")),
            RepoError::Forbidden(_) => ServerError::Forbidden("invalid edit token".into()),
            RepoError::Store(e) => ServerError::Storage(e.to_string()),
            e @ RepoError::Corrupt { .. } => ServerError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Validation(_) | ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            ServerError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ServerError::Storage(_) | ServerError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            ok: false,
            error: message,
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_shared::NoteId;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServerError::from(RepoError::Validation(ValidationError::EmptyNote)), StatusCode::BAD_REQUEST),
            (ServerError::from(RepoError::NotFound(NoteId::from("a"))), StatusCode::NOT_FOUND),
            (ServerError::from(RepoError::Forbidden(NoteId::from("a"))), StatusCode::FORBIDDEN),
            (ServerError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
            (ServerError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (ServerError::Storage("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
