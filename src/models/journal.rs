//! Journal entries with write-time sentiment.

use crate::services::sentiment::Sentiment;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub sentiment: Sentiment,
    /// RFC3339 UTC
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct AddEntryRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub entry_id: String,
    #[validate(length(min = 1, max = 20000))]
    pub new_content: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteEntryRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub entry_id: String,
}
