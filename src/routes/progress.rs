// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress tracking and report data routes.
//!
//! Every mutation touches two documents: the user's running totals and the
//! rollup for the current week. The weekly update is a plain
//! read-modify-write; two concurrent requests for the same user can lose
//! one increment.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::progress::{
    merge_weekly_for_report, MoodTrendPoint, ProgressSummary, ReportData, ReportMetadata,
    REPORT_WINDOW_DAYS,
};
use crate::models::{Progress, WeeklyProgress};
use crate::time_utils::{format_utc_rfc3339, parse_user_datetime};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Weekly docs considered for report data.
const REPORT_WEEKS: u32 = 2;

/// Public progress routes (identified by uid in path or body).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/progress/mood", post(log_mood))
        .route(
            "/api/progress/chatbot-interaction",
            post(record_chat_interaction),
        )
        .route("/api/progress/active-time", post(record_active_time))
        .route("/api/progress/journal-entry", post(record_journal_entry))
        .route(
            "/api/progress/journal-entry-delete",
            post(remove_journal_entry),
        )
        .route("/api/progress/{user_id}", get(get_progress))
        .route("/api/progress/{user_id}/mood-trend", get(mood_trend))
}

/// Report routes (require authentication).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/report-data", get(report_data))
}

/// Progress is keyed by Firebase uid; emails are a common client mistake.
pub fn normalize_user_id(raw: &str) -> Result<String> {
    let uid = raw.trim();
    if uid.is_empty() {
        return Err(AppError::BadRequest("userId is required".to_string()));
    }
    if uid.contains('@') {
        return Err(AppError::BadRequest(
            "userId must be a Firebase UID, not an email".to_string(),
        ));
    }
    Ok(uid.to_string())
}

async fn load_or_init(state: &AppState, uid: &str, now: DateTime<Utc>) -> Result<Progress> {
    Ok(state
        .db
        .get_progress(uid)
        .await?
        .unwrap_or_else(|| Progress::new(uid, now)))
}

/// Apply `update` to this week's rollup, creating it on first use.
async fn update_weekly<F>(state: &AppState, uid: &str, now: DateTime<Utc>, update: F) -> Result<()>
where
    F: FnOnce(&mut WeeklyProgress),
{
    let doc_id = WeeklyProgress::document_id(uid, now);
    let mut weekly = state
        .db
        .get_weekly_progress(&doc_id)
        .await?
        .unwrap_or_else(|| WeeklyProgress::new(uid, now));

    update(&mut weekly);
    weekly.touch(now);

    state.db.set_weekly_progress(&doc_id, &weekly).await
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalCountResponse {
    pub success: bool,
    pub journal_entries: u32,
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ProgressSummary>> {
    let uid = normalize_user_id(&user_id)?;
    let now = Utc::now();

    let progress = match state.db.get_progress(&uid).await? {
        Some(p) => p,
        None => {
            let fresh = Progress::new(&uid, now);
            state.db.set_progress(&fresh).await?;
            tracing::info!(user_id = %uid, "Initialized progress document");
            fresh
        }
    };

    Ok(Json(progress.summary(now)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MoodRequest {
    user_id: String,
    mood: Option<f64>,
    date: Option<String>,
}

async fn log_mood(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MoodRequest>,
) -> Result<Json<SuccessResponse>> {
    let uid = normalize_user_id(&body.user_id)?;
    let mood = body
        .mood
        .filter(|m| m.is_finite())
        .ok_or_else(|| AppError::BadRequest("mood is required".to_string()))?;

    let now = Utc::now();
    let date = match body.date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(raw) => parse_user_datetime(raw)
            .ok_or_else(|| AppError::BadRequest(format!("invalid date: {raw}")))?,
        None => now,
    };

    let mut progress = load_or_init(&state, &uid, now).await?;
    progress.record_mood(mood, date);
    state.db.set_progress(&progress).await?;

    update_weekly(&state, &uid, now, |weekly| weekly.record_mood(mood, now)).await?;

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodTrendResponse {
    pub mood_trend: Vec<MoodTrendPoint>,
}

async fn mood_trend(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<MoodTrendResponse>> {
    let uid = normalize_user_id(&user_id)?;
    let progress = state
        .db
        .get_progress(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound("User progress not found".to_string()))?;

    Ok(Json(MoodTrendResponse {
        mood_trend: progress.mood_trend(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ChatInteractionRequest {
    user_id: String,
    user_message: String,
    bot_message: String,
}

async fn record_chat_interaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatInteractionRequest>,
) -> Result<Json<SuccessResponse>> {
    let uid = normalize_user_id(&body.user_id)?;
    let now = Utc::now();

    let mut progress = load_or_init(&state, &uid, now).await?;
    progress.record_chat_interaction(now);
    state.db.set_progress(&progress).await?;

    update_weekly(&state, &uid, now, |weekly| {
        weekly.record_chat_pair(&body.user_message, &body.bot_message, now)
    })
    .await?;

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ActiveTimeRequest {
    user_id: String,
    seconds: u64,
}

async fn record_active_time(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActiveTimeRequest>,
) -> Result<Json<SuccessResponse>> {
    let uid = normalize_user_id(&body.user_id)?;
    let now = Utc::now();
    let minutes = body.seconds / 60;

    let mut progress = load_or_init(&state, &uid, now).await?;
    progress.record_active_minutes(minutes, now);
    state.db.set_progress(&progress).await?;

    update_weekly(&state, &uid, now, |weekly| {
        weekly.record_active_minutes(minutes, now)
    })
    .await?;

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UserIdRequest {
    user_id: String,
}

async fn record_journal_entry(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UserIdRequest>,
) -> Result<Json<JournalCountResponse>> {
    let uid = normalize_user_id(&body.user_id)?;
    let now = Utc::now();

    let mut progress = load_or_init(&state, &uid, now).await?;
    let journal_entries = progress.increment_journal_entries(now);
    state.db.set_progress(&progress).await?;

    update_weekly(&state, &uid, now, |weekly| {
        weekly.increment_journal_entries(now)
    })
    .await?;

    Ok(Json(JournalCountResponse {
        success: true,
        journal_entries,
    }))
}

async fn remove_journal_entry(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UserIdRequest>,
) -> Result<Json<JournalCountResponse>> {
    let uid = normalize_user_id(&body.user_id)?;
    let now = Utc::now();

    let mut progress = state
        .db
        .get_progress(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound("User progress not found".to_string()))?;
    let journal_entries = progress.decrement_journal_entries(now);
    state.db.set_progress(&progress).await?;

    update_weekly(&state, &uid, now, |weekly| {
        weekly.decrement_journal_entries(now)
    })
    .await?;

    Ok(Json(JournalCountResponse {
        success: true,
        journal_entries,
    }))
}

/// Last week of activity for the caller, shaped for the report renderer.
async fn report_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ReportData>> {
    let now = Utc::now();
    let cutoff = format_utc_rfc3339(now - chrono::Duration::days(REPORT_WINDOW_DAYS));

    let display_name = state
        .db
        .get_user_profile(&user.uid)
        .await?
        .and_then(|p| p.username)
        .or(user.name)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "User".to_string());

    let weeks = state
        .db
        .recent_weekly_progress(&user.uid, &cutoff, REPORT_WEEKS)
        .await?;
    let progresses = merge_weekly_for_report(&weeks, now);

    tracing::info!(
        user_id = %user.uid,
        weeks = weeks.len(),
        mood_entries = progresses.mood_data.len(),
        "Report data assembled"
    );

    Ok(Json(ReportData {
        display_name,
        progresses,
        metadata: ReportMetadata {
            fetched_at: format_utc_rfc3339(now),
        },
    }))
}
