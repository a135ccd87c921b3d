// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat transcript routes.

use crate::error::{AppError, Result};
use crate::models::chat::{ChatMessage, ChatSession, ChatSessionSummary, SaveChatRequest};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chats", get(list_sessions).post(save_session))
        .route("/api/chats/{id}", get(get_session).delete(delete_session))
}

#[derive(Serialize)]
pub struct SaveChatResponse {
    pub id: String,
}

async fn save_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveChatRequest>,
) -> Result<(StatusCode, Json<SaveChatResponse>)> {
    body.validate()?;

    let session = ChatSession {
        id: uuid::Uuid::new_v4().to_string(),
        email: body.email.trim().to_lowercase(),
        messages: body.messages,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    state.db.create_chat_session(&session).await?;

    tracing::debug!(session_id = %session.id, messages = session.messages.len(), "Chat session saved");

    Ok((StatusCode::CREATED, Json(SaveChatResponse { id: session.id })))
}

#[derive(Deserialize)]
struct ListQuery {
    email: Option<String>,
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ChatSessionSummary>>> {
    let email = query
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("email is required".to_string()))?;

    Ok(Json(state.db.list_chat_sessions(&email).await?))
}

#[derive(Serialize)]
pub struct ChatTranscript {
    pub messages: Vec<ChatMessage>,
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChatTranscript>> {
    let session = state
        .db
        .get_chat_session(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("chat session {id}")))?;

    Ok(Json(ChatTranscript {
        messages: session.messages,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteChatResponse {
    pub deleted_count: u32,
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteChatResponse>> {
    let deleted_count = state.db.delete_chat_session(&id).await?;
    if deleted_count == 0 {
        return Err(AppError::NotFound("Chat session not found".to_string()));
    }
    Ok(Json(DeleteChatResponse { deleted_count }))
}
