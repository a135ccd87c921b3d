// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email verification codes.
//!
//! The code is mailed to the address and never returned to the client;
//! the client proves ownership by submitting it back.

use crate::error::{AppError, Result};
use crate::models::notification::{SendCodeRequest, VerifyCodeRequest};
use crate::models::VerificationCode;
use crate::services::notifications::{
    check_code, verification_email, CodeCheck, VERIFICATION_CODE_TTL_MINUTES,
};
use crate::services::random;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/send-verification-code", post(send_code))
        .route("/api/verify-code", post(verify_code))
}

#[derive(Serialize)]
pub struct SendCodeResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct VerifyCodeResponse {
    pub verified: bool,
}

fn rejected() -> AppError {
    AppError::BadRequest("Invalid or expired verification code".to_string())
}

async fn send_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>> {
    body.validate()?;
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Email delivery is not configured".to_string()))?;

    let email = body.email.trim().to_lowercase();
    let code = random::verification_code()?;
    let expires_at = Utc::now() + chrono::Duration::minutes(VERIFICATION_CODE_TTL_MINUTES);

    state
        .db
        .set_verification_code(&VerificationCode {
            email: email.clone(),
            code: code.clone(),
            expires_at: format_utc_rfc3339(expires_at),
            attempts: 0,
        })
        .await?;
    mailer.send(verification_email(&email, &code)).await?;

    Ok(Json(SendCodeResponse {
        message: "Verification code sent".to_string(),
    }))
}

async fn verify_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>> {
    body.validate()?;
    let email = body.email.trim().to_lowercase();

    let mut stored = state
        .db
        .get_verification_code(&email)
        .await?
        .ok_or_else(rejected)?;

    match check_code(&stored, &body.code, Utc::now()) {
        CodeCheck::Valid => {
            state.db.delete_verification_code(&email).await?;
            Ok(Json(VerifyCodeResponse { verified: true }))
        }
        CodeCheck::Mismatch => {
            stored.attempts = stored.attempts.saturating_add(1);
            state.db.set_verification_code(&stored).await?;
            Err(rejected())
        }
        CodeCheck::Spent => {
            state.db.delete_verification_code(&email).await?;
            Err(rejected())
        }
    }
}
