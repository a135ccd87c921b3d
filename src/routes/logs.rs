// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tamper-evident activity log routes.
//!
//! Both routes sit behind the Firebase auth middleware; the log owner is
//! always the token's uid, never a client-supplied id.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::LogEntry;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest message accepted; each byte costs calldata gas.
const MAX_MESSAGE_LEN: usize = 2000;

/// Log routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/log", post(record_log))
        .route("/api/logs", get(get_logs))
}

#[derive(Debug, Deserialize)]
pub struct LogRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LogResponse {
    pub message: String,
    pub tx_hash: String,
}

/// Append a log line for the caller.
async fn record_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LogRequest>,
) -> Result<Json<LogResponse>> {
    // Stored exactly as sent; whitespace-only lines are still rejected.
    if body.message.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    if body.message.len() > MAX_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "message exceeds {MAX_MESSAGE_LEN} bytes"
        )));
    }

    let tx_hash = state.logs.record_log(&user.uid, &body.message).await?;

    Ok(Json(LogResponse {
        message: "Log stored on blockchain".to_string(),
        tx_hash,
    }))
}

/// All of the caller's log lines, newest first.
async fn get_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<LogEntry>>> {
    let entries = state.logs.fetch_logs(&user.uid).await?;
    Ok(Json(entries))
}
