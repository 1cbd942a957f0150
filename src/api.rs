use crate::model::Blink;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/blinks`. Every field is optional at this layer so that
/// missing values surface as a validation failure rather than a parse failure.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlinkRequest {
    pub unique_blink_id: Option<String>,
    pub codename: Option<String>,
    pub email: Option<String>,
    pub solana_key: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Envelope shared by every endpoint.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct APIResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Blink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl APIResponse {
    pub fn ok() -> Self {
        APIResponse {
            success: true,
            ..Default::default()
        }
    }

    pub fn with_blink(blink: Blink) -> Self {
        APIResponse {
            success: true,
            data: Some(blink),
            ..Default::default()
        }
    }

    pub fn failure(msg: &str) -> Self {
        APIResponse {
            success: false,
            error: Some(msg.to_owned()),
            ..Default::default()
        }
    }

    pub fn failure_with_details(msg: &str, details: String) -> Self {
        APIResponse {
            success: false,
            error: Some(msg.to_owned()),
            details: Some(details),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_omits_data_and_details() {
        let body = serde_json::to_value(APIResponse::failure("Missing required fields")).unwrap();
        assert_eq!(body, json!({ "success": false, "error": "Missing required fields" }));
    }

    #[test]
    fn test_success_keeps_null_image_url() {
        let blink = Blink {
            unique_blink_id: "abc123".into(),
            codename: "Neo".into(),
            email: "neo@matrix.io".into(),
            solana_key: "5Gh...".into(),
            description: String::new(),
            image_url: None,
        };
        let body = serde_json::to_value(APIResponse::with_blink(blink)).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "data": {
                    "uniqueBlinkId": "abc123",
                    "codename": "Neo",
                    "email": "neo@matrix.io",
                    "solanaKey": "5Gh...",
                    "description": "",
                    "imageUrl": null
                }
            })
        );
    }

    #[test]
    fn test_request_ignores_unknown_fields() {
        let req: CreateBlinkRequest =
            serde_json::from_value(json!({ "codename": "Neo", "extra": 1 })).unwrap();
        assert_eq!(req.codename.as_deref(), Some("Neo"));
        assert!(req.unique_blink_id.is_none());
    }
}
