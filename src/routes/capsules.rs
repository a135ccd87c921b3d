// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-capsule routes.
//!
//! Uploads are written to local disk, optionally passed through the external
//! steganography encoder, and only then recorded in Firestore. Any failure
//! after the first write removes what was written.

use crate::error::{AppError, Result};
use crate::models::{CapsuleView, TimeCapsule};
use crate::services::encoder::CarrierKind;
use crate::services::capsule_storage::StoredFile;
use crate::time_utils::{format_utc_rfc3339, parse_user_datetime};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
/// Room for the text fields and multipart framing around the file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

const STEG_PREFIX: &str = "steg_";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/time-capsule",
            get(list_capsules)
                .post(create_capsule)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route("/api/time-capsule/{id}/file", get(capsule_file))
}

#[derive(Default)]
struct CapsuleForm {
    user_id: Option<String>,
    description: Option<String>,
    unlock_date_time: Option<String>,
    use_steganography: bool,
    hidden_message: Option<String>,
    file: Option<UploadedFile>,
}

struct UploadedFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid multipart body: {}", e.body_text()))
}

async fn read_form(mut multipart: Multipart) -> Result<CapsuleForm> {
    let mut form = CapsuleForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if bytes.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest("file exceeds 50 MB limit".to_string()));
            }
            form.file = Some(UploadedFile {
                name: file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "userId" => form.user_id = value,
            "description" => form.description = value,
            "unlockDateTime" => form.unlock_date_time = value,
            "useSteganography" => form.use_steganography = value.as_deref() == Some("true"),
            "hiddenMessage" => form.hidden_message = value,
            other => tracing::debug!(field = other, "Ignoring unknown capsule form field"),
        }
    }

    Ok(form)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCapsuleResponse {
    pub success: bool,
    pub message: String,
    pub capsule_id: String,
}

async fn create_capsule(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreateCapsuleResponse>)> {
    let form = read_form(multipart).await?;

    let (Some(user_id), Some(description), Some(unlock_raw)) =
        (form.user_id, form.description, form.unlock_date_time)
    else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };
    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    let unlock_date = parse_user_datetime(&unlock_raw)
        .ok_or_else(|| AppError::BadRequest("Invalid date format".to_string()))?;

    // Steganography needs both the flag and a message; the flag alone is ignored.
    let hidden = match (form.use_steganography, form.hidden_message) {
        (true, Some(message)) => {
            let kind = CarrierKind::from_content_type(&file.content_type).ok_or_else(|| {
                AppError::BadRequest("Steganography only supports images and videos".to_string())
            })?;
            if state.encoder.is_none() {
                return Err(AppError::BadRequest(
                    "Steganography is not available on this server".to_string(),
                ));
            }
            Some((kind, message))
        }
        _ => None,
    };

    let stored = state.capsules.save(&file.name, &file.bytes).await?;

    let result = finish_capsule(&state, &stored, hidden, |filename, hidden_message| {
        TimeCapsule {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            filename,
            file_type: file.content_type.clone(),
            description,
            unlock_date: format_utc_rfc3339(unlock_date),
            use_steganography: form.use_steganography,
            hidden_message,
            created_at: format_utc_rfc3339(Utc::now()),
            file_size: file.bytes.len() as u64,
        }
    })
    .await;

    match result {
        Ok(capsule_id) => Ok((
            StatusCode::CREATED,
            Json(CreateCapsuleResponse {
                success: true,
                message: "Time Capsule created successfully!".to_string(),
                capsule_id,
            }),
        )),
        Err(e) => {
            state.capsules.remove(&stored.path).await;
            Err(e)
        }
    }
}

/// Encode (if requested) and record the capsule. Returns the capsule id.
async fn finish_capsule<F>(
    state: &AppState,
    stored: &StoredFile,
    hidden: Option<(CarrierKind, String)>,
    build: F,
) -> Result<String>
where
    F: FnOnce(String, Option<String>) -> TimeCapsule,
{
    let capsule = match (hidden, state.encoder.as_ref()) {
        (Some((kind, message)), Some(encoder)) => {
            let steg_name = format!("{STEG_PREFIX}{}", stored.filename);
            let steg_path = state.capsules.path_for(&steg_name)?;

            if let Err(e) = encoder
                .encode(kind, &stored.path, &steg_path, &message)
                .await
            {
                state.capsules.remove(&steg_path).await;
                return Err(AppError::Storage(format!(
                    "Failed to process steganography: {e}"
                )));
            }
            state.capsules.remove(&stored.path).await;

            let capsule = build(steg_name, Some(message));
            if let Err(e) = state.db.create_time_capsule(&capsule).await {
                state.capsules.remove(&steg_path).await;
                return Err(e);
            }
            capsule
        }
        _ => {
            let capsule = build(stored.filename.clone(), None);
            state.db.create_time_capsule(&capsule).await?;
            capsule
        }
    };

    tracing::info!(
        capsule_id = %capsule.id,
        user_id = %capsule.user_id,
        unlock_date = %capsule.unlock_date,
        steganography = capsule.use_steganography,
        size = capsule.file_size,
        "Time capsule created"
    );

    Ok(capsule.id)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    user_id: Option<String>,
}

async fn list_capsules(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CapsuleView>>> {
    let user_id = query
        .user_id
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;

    let now = Utc::now();
    let capsules = state.db.list_time_capsules(user_id.trim()).await?;
    Ok(Json(capsules.iter().map(|c| c.view(now)).collect()))
}

async fn capsule_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    let capsule = state
        .db
        .get_time_capsule(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("time capsule {id}")))?;

    if !capsule.is_unlocked(Utc::now()) {
        return Err(AppError::Forbidden(format!(
            "capsule is locked until {}",
            capsule.unlock_date
        )));
    }

    let bytes = state
        .capsules
        .read(&capsule.filename)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("file for time capsule {id}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, capsule.file_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", capsule.filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
