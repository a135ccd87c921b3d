//! Time capsules: uploads released at a future instant.

use crate::time_utils::parse_rfc3339;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored capsule metadata. The file itself lives in the uploads directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeCapsule {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub file_type: String,
    pub description: String,
    /// RFC3339 UTC
    pub unlock_date: String,
    #[serde(default)]
    pub use_steganography: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_message: Option<String>,
    pub created_at: String,
    pub file_size: u64,
}

impl TimeCapsule {
    /// Unparseable unlock dates never unlock.
    pub fn is_unlocked(&self, now: DateTime<Utc>) -> bool {
        parse_rfc3339(&self.unlock_date).is_some_and(|unlock| now >= unlock)
    }

    /// Client view; the hidden message stays server-side until unlock.
    pub fn view(&self, now: DateTime<Utc>) -> CapsuleView {
        let is_unlocked = self.is_unlocked(now);
        CapsuleView {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            filename: self.filename.clone(),
            file_type: self.file_type.clone(),
            description: self.description.clone(),
            unlock_date: self.unlock_date.clone(),
            use_steganography: self.use_steganography,
            hidden_message: if is_unlocked {
                self.hidden_message.clone()
            } else {
                None
            },
            created_at: self.created_at.clone(),
            file_size: self.file_size,
            is_unlocked,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsuleView {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub file_type: String,
    pub description: String,
    pub unlock_date: String,
    pub use_steganography: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_message: Option<String>,
    pub created_at: String,
    pub file_size: u64,
    pub is_unlocked: bool,
}
