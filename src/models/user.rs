//! User profile and notification preferences.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Profile mirrored from Firebase Auth into the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Email notification preference, keyed by uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub uid: String,
    pub email: String,
    pub email_notifications_enabled: bool,
    pub last_updated: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailPreferenceRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(email)]
    pub email: String,
    pub email_notifications_enabled: bool,
}
