// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile picture and email preference routes.

use crate::error::{AppError, Result};
use crate::models::content::{EmailOnlyRequest, ProfilePictureRequest};
use crate::models::user::EmailPreferenceRequest;
use crate::models::{ProfilePicture, UserPreferences};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Decoded image size limit for inline profile pictures.
const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/profile-picture",
            get(get_picture)
                .put(put_picture)
                .delete(delete_picture)
                // base64 inflates by 4/3
                .layer(DefaultBodyLimit::max(MAX_PICTURE_BYTES * 4 / 3 + 4096)),
        )
        .route("/api/email-preference", post(set_email_preference))
        .route("/api/email-preference/{uid}", get(get_email_preference))
}

/// Accept only `data:image/<subtype>;base64,<payload>` with a decodable payload.
pub fn validate_image_data_url(url: &str) -> Result<()> {
    let invalid = |why: &str| AppError::BadRequest(format!("profilePicture {why}"));

    let rest = url
        .strip_prefix("data:image/")
        .ok_or_else(|| invalid("must be a data:image/ URL"))?;
    let (subtype, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| invalid("must be base64 encoded"))?;
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric() || "+.-".contains(c)) {
        return Err(invalid("has an invalid image type"));
    }

    let decoded = STANDARD
        .decode(payload)
        .map_err(|_| invalid("has an invalid base64 payload"))?;
    if decoded.is_empty() {
        return Err(invalid("is empty"));
    }
    if decoded.len() > MAX_PICTURE_BYTES {
        return Err(invalid("is too large"));
    }
    Ok(())
}

#[derive(Deserialize)]
struct EmailQuery {
    email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePictureResponse {
    pub profile_picture: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn get_picture(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<ProfilePictureResponse>> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("email is required".to_string()))?;

    let picture = state
        .db
        .get_profile_picture(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile picture not found".to_string()))?;

    Ok(Json(ProfilePictureResponse {
        profile_picture: picture.profile_picture,
    }))
}

async fn put_picture(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProfilePictureRequest>,
) -> Result<Json<MessageResponse>> {
    body.validate()?;
    validate_image_data_url(&body.profile_picture)?;

    state
        .db
        .set_profile_picture(&ProfilePicture {
            email: body.email.trim().to_lowercase(),
            profile_picture: body.profile_picture,
            updated_at: format_utc_rfc3339(chrono::Utc::now()),
        })
        .await?;

    Ok(Json(MessageResponse {
        message: "Profile picture updated successfully".to_string(),
    }))
}

async fn delete_picture(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailOnlyRequest>,
) -> Result<Json<MessageResponse>> {
    body.validate()?;

    let existed = state.db.delete_profile_picture(&body.email).await?;
    tracing::debug!(existed, "Profile picture delete");

    Ok(Json(MessageResponse {
        message: "Profile picture deleted successfully".to_string(),
    }))
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

async fn set_email_preference(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailPreferenceRequest>,
) -> Result<Json<SuccessResponse>> {
    body.validate()?;

    state
        .db
        .set_user_preferences(&UserPreferences {
            uid: body.user_id.trim().to_string(),
            email: body.email,
            email_notifications_enabled: body.email_notifications_enabled,
            last_updated: format_utc_rfc3339(chrono::Utc::now()),
        })
        .await?;

    tracing::info!(
        uid = %body.user_id,
        enabled = body.email_notifications_enabled,
        "Email preference updated"
    );

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPreferenceResponse {
    pub email_notifications_enabled: bool,
}

async fn get_email_preference(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<EmailPreferenceResponse>> {
    let enabled = state
        .db
        .get_user_preferences(&uid)
        .await?
        .is_some_and(|p| p.email_notifications_enabled);

    Ok(Json(EmailPreferenceResponse {
        email_notifications_enabled: enabled,
    }))
}
