use serde::{Deserialize, Serialize};

/// A persisted blink, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blink {
    pub unique_blink_id: String,
    pub codename: String,
    pub email: String,
    pub solana_key: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// Validated input for a blink insert. Optional fields are already defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlink {
    pub unique_blink_id: String,
    pub codename: String,
    pub email: String,
    pub solana_key: String,
    pub description: String,
    pub image_url: Option<String>,
}

impl From<NewBlink> for Blink {
    fn from(new: NewBlink) -> Self {
        Blink {
            unique_blink_id: new.unique_blink_id,
            codename: new.codename,
            email: new.email,
            solana_key: new.solana_key,
            description: new.description,
            image_url: new.image_url,
        }
    }
}
