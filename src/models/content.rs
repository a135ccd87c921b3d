//! Quotes, feedback and profile pictures.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub name: String,
    pub feedback: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct FeedbackRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 5000))]
    pub feedback: String,
}

/// Profile picture stored inline as a data URL, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePicture {
    pub email: String,
    pub profile_picture: String,
    pub updated_at: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePictureRequest {
    #[validate(email)]
    pub email: String,
    pub profile_picture: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct EmailOnlyRequest {
    #[validate(email)]
    pub email: String,
}
