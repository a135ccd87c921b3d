// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token authentication middleware.

use crate::error::AppError;
use crate::services::firebase_auth::AuthError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from a Firebase ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Middleware that requires a valid Firebase ID token.
///
/// No token is 401; a token that fails verification is 403.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request.headers().get(header::AUTHORIZATION);

    let user = state
        .auth
        .verify_bearer(auth_header)
        .await
        .map_err(|err| match err {
            AuthError::Missing => AppError::Unauthorized,
            AuthError::Invalid(reason) => {
                tracing::warn!(reason = %reason, "Rejected request: invalid ID token");
                AppError::InvalidToken
            }
            AuthError::Transient(reason) => AppError::Internal(anyhow::anyhow!(
                "ID token verification transient failure: {reason}"
            )),
        })?;

    request.extensions_mut().insert(AuthUser {
        uid: user.uid,
        email: user.email,
        name: user.name,
    });

    Ok(next.run(request).await)
}
