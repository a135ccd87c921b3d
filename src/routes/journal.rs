// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal routes. Sentiment is computed on every write.

use crate::error::{AppError, Result};
use crate::models::journal::{
    AddEntryRequest, DeleteEntryRequest, JournalEntry, UpdateEntryRequest,
};
use crate::services::sentiment::{self, Sentiment};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/journal",
            post(add_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/journal/{user_id}", get(list_entries))
}

#[derive(Serialize)]
pub struct AddEntryResponse {
    pub message: String,
    pub id: String,
    pub sentiment: Sentiment,
}

async fn add_entry(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddEntryRequest>,
) -> Result<(StatusCode, Json<AddEntryResponse>)> {
    body.validate()?;

    let sentiment = sentiment::analyze(&body.content);
    let entry = JournalEntry {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: body.user_id,
        content: body.content,
        sentiment,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
        updated_at: None,
    };
    state.db.set_journal_entry(&entry).await?;

    tracing::debug!(entry_id = %entry.id, sentiment = %sentiment, "Journal entry added");

    Ok((
        StatusCode::CREATED,
        Json(AddEntryResponse {
            message: "Journal entry added successfully".to_string(),
            id: entry.id,
            sentiment,
        }),
    ))
}

async fn list_entries(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<JournalEntry>>> {
    Ok(Json(state.db.list_journal_entries(&user_id).await?))
}

#[derive(Serialize)]
pub struct UpdateEntryResponse {
    pub message: String,
    pub sentiment: Sentiment,
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateEntryRequest>,
) -> Result<Json<UpdateEntryResponse>> {
    body.validate()?;

    let mut entry = state
        .db
        .get_journal_entry(&body.user_id, &body.entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("journal entry {}", body.entry_id)))?;

    entry.sentiment = sentiment::analyze(&body.new_content);
    entry.content = body.new_content;
    entry.updated_at = Some(format_utc_rfc3339(chrono::Utc::now()));
    state.db.set_journal_entry(&entry).await?;

    Ok(Json(UpdateEntryResponse {
        message: "Journal entry updated successfully".to_string(),
        sentiment: entry.sentiment,
    }))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeleteEntryRequest>,
) -> Result<Json<MessageResponse>> {
    body.validate()?;

    if state
        .db
        .get_journal_entry(&body.user_id, &body.entry_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!("journal entry {}", body.entry_id)));
    }
    state.db.delete_journal_entry(&body.entry_id).await?;

    Ok(Json(MessageResponse {
        message: "Journal entry deleted successfully".to_string(),
    }))
}
