//! Email verification codes and scheduled affirmations.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// An affirmation mailed to users who opted in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affirmation {
    pub text: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "Wellbeing".to_string()
}

/// Outstanding verification code, keyed by URL-encoded email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationCode {
    pub email: String,
    pub code: String,
    pub expires_at: String,
    /// Wrong guesses so far
    #[serde(default)]
    pub attempts: u32,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SendCodeRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct VerifyCodeRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub code: String,
}
