//! Chatbot conversation transcripts.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// Stored chat session; messages keep their array order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub email: String,
    pub messages: Vec<ChatMessage>,
    /// RFC3339 UTC
    pub created_at: String,
}

/// Listing entry; transcripts are fetched one at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionSummary {
    pub id: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SaveChatRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "messages must not be empty"))]
    pub messages: Vec<ChatMessage>,
}
