// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quotes and feedback.

use crate::error::{AppError, Result};
use crate::models::content::FeedbackRequest;
use crate::models::{Feedback, Quote};
use crate::services::random::random_index;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/quotes/random", get(random_quote))
        .route("/api/feedback", get(list_feedback).post(submit_feedback))
}

async fn random_quote(State(state): State<Arc<AppState>>) -> Result<Json<Quote>> {
    let mut quotes = state.db.list_quotes().await?;
    if quotes.is_empty() {
        return Err(AppError::NotFound("No quotes found".to_string()));
    }
    let index = random_index(quotes.len())?;
    Ok(Json(quotes.swap_remove(index)))
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub message: String,
    pub id: String,
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>)> {
    body.validate()?;

    let feedback = Feedback {
        id: uuid::Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        feedback: body.feedback.trim().to_string(),
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    state.db.create_feedback(&feedback).await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            message: "Feedback submitted successfully".to_string(),
            id: feedback.id,
        }),
    ))
}

async fn list_feedback(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Feedback>>> {
    Ok(Json(state.db.list_feedback().await?))
}
