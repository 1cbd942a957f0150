use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::APIResponse;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] libsql::Error),

    #[error("insert returned no row for blink {0}")]
    NothingReturned(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Every way a create request can end short of success.
#[derive(Debug, Error)]
pub enum CreateBlinkError {
    #[error("Invalid request format")]
    InvalidFormat(#[source] serde_json::Error),

    #[error("Invalid request format")]
    UnreadableBody(#[source] BytesRejection),

    #[error("Missing required fields")]
    MissingFields,

    #[error("A blink with this ID already exists")]
    AlreadyExists,

    #[error("Failed to create blink")]
    Store(#[from] StoreError),
}

impl CreateBlinkError {
    pub fn status_code(&self) -> StatusCode {
        use CreateBlinkError::*;
        match self {
            InvalidFormat(_) | UnreadableBody(_) | MissingFields => StatusCode::BAD_REQUEST,
            AlreadyExists => StatusCode::CONFLICT,
            Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CreateBlinkError {
    fn into_response(self) -> Response {
        let body = match &self {
            CreateBlinkError::Store(e) => APIResponse::failure_with_details(&self.to_string(), crate::unpack_error(e)),
            _ => APIResponse::failure(&self.to_string()),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(CreateBlinkError::InvalidFormat(bad_json).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CreateBlinkError::MissingFields.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CreateBlinkError::AlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            CreateBlinkError::Store(StoreError::NothingReturned("x".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_details_keep_the_chain() {
        let err = StoreError::Other(anyhow::anyhow!("disk full").context("insert failed"));
        assert_eq!(crate::unpack_error(&err), "insert failed: disk full");
    }
}
