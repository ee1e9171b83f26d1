use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use seqstore_core::SequenceError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Sequence(e) => match e {
                SequenceError::Address(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SequenceError::RangeOutOfBounds { .. }
                | SequenceError::EmptyContent
                | SequenceError::InvalidSequence(_) => StatusCode::BAD_REQUEST,
                SequenceError::DigestMismatch { .. } => StatusCode::CONFLICT,
                e if e.is_not_found() => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
