use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::info;

use crate::api::{APIResponse, CreateBlinkRequest};
use crate::error::CreateBlinkError;
use crate::model::{Blink, NewBlink};
use crate::repository::BlinkRepository;

#[derive(Clone)]
pub struct AppState {
    pub blinks: Arc<dyn BlinkRepository>,
}

impl CreateBlinkRequest {
    /// Applies the required-field rule and fills in defaults for the optional
    /// fields. Empty strings count as missing.
    pub fn into_new_blink(self) -> Result<NewBlink, CreateBlinkError> {
        fn required(field: Option<String>) -> Result<String, CreateBlinkError> {
            field
                .filter(|value| !value.is_empty())
                .ok_or(CreateBlinkError::MissingFields)
        }

        Ok(NewBlink {
            unique_blink_id: required(self.unique_blink_id)?,
            codename: required(self.codename)?,
            email: required(self.email)?,
            solana_key: required(self.solana_key)?,
            description: self.description.unwrap_or_default(),
            image_url: self.image_url,
        })
    }
}

const REQUIRED_FIELDS: [&str; 4] = ["uniqueBlinkId", "codename", "email", "solanaKey"];

/// `null`, `false`, `0` and `""` are falsy; every other JSON value is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parses a raw create body. Anything that is not JSON is a format error. The
/// required fields are checked for truthiness before any typing, so a falsy
/// field of any JSON type is reported as missing; JSON that is not an object
/// has no fields at all.
pub fn parse_create_body(body: &[u8]) -> Result<NewBlink, CreateBlinkError> {
    let value: Value = serde_json::from_slice(body).map_err(CreateBlinkError::InvalidFormat)?;
    tracing::debug!(payload = %value, "received create blink request");

    let present = |field: &str| value.get(field).is_some_and(is_truthy);
    if !value.is_object() || !REQUIRED_FIELDS.into_iter().all(present) {
        return Err(CreateBlinkError::MissingFields);
    }

    let request: CreateBlinkRequest = serde_json::from_value(value).map_err(CreateBlinkError::InvalidFormat)?;
    request.into_new_blink()
}

async fn insert_blink(
    repo: &dyn BlinkRepository,
    body: Result<Bytes, BytesRejection>,
) -> Result<Blink, CreateBlinkError> {
    let body = body.map_err(CreateBlinkError::UnreadableBody)?;
    let new = parse_create_body(&body)?;

    if repo.find_unique(&new.unique_blink_id).await?.is_some() {
        return Err(CreateBlinkError::AlreadyExists);
    }

    Ok(repo.create(new).await?)
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(APIResponse::ok())
}

pub async fn create_blink(State(state): State<AppState>, body: Result<Bytes, BytesRejection>) -> Response {
    match insert_blink(state.blinks.as_ref(), body).await {
        Ok(blink) => {
            info!(unique_blink_id = %blink.unique_blink_id, "created blink");
            (StatusCode::OK, Json(APIResponse::with_blink(blink))).into_response()
        }
        Err(e) => {
            match &e {
                CreateBlinkError::Store(err) => {
                    tracing::error!(error = %crate::unpack_error(err), "failed to create blink");
                }
                CreateBlinkError::InvalidFormat(err) => {
                    tracing::warn!(error = %err, "rejected create blink request");
                }
                CreateBlinkError::UnreadableBody(err) => {
                    tracing::warn!(error = %err, "failed to read create blink body");
                }
                _ => info!(reason = %e, "rejected create blink request"),
            }
            e.into_response()
        }
    }
}

pub async fn get_blink(State(state): State<AppState>, Path(unique_blink_id): Path<String>) -> Response {
    match state.blinks.find_unique(&unique_blink_id).await {
        Ok(Some(blink)) => (StatusCode::OK, Json(APIResponse::with_blink(blink))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(APIResponse::failure("Blink not found"))).into_response(),
        Err(e) => {
            let details = crate::unpack_error(&e);
            tracing::error!(error = %details, unique_blink_id = %unique_blink_id, "failed to fetch blink");
            crate::server_error(APIResponse::failure_with_details("Failed to fetch blink", details))
        }
    }
}
