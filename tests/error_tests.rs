// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{http::StatusCode, response::IntoResponse};
use lifesync::error::AppError;
use lifesync::services::ChainError;
use serde_json::Value;

async fn body_json(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::FORBIDDEN),
        (AppError::Forbidden("locked".into()), StatusCode::FORBIDDEN),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (AppError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (AppError::Mail("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (AppError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
    ];

    for (err, expected) in cases {
        assert_eq!(err.into_response().status(), expected);
    }
}

#[tokio::test]
async fn test_bad_request_carries_details() {
    let (status, body) = body_json(AppError::BadRequest("userId is required".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["details"], "userId is required");
}

#[tokio::test]
async fn test_chain_errors_do_not_leak_node_messages() {
    let write: AppError =
        ChainError::Write("insufficient funds for gas * price + value: 0x00..aa".into()).into();
    let (status, body) = body_json(write).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "chain_write_error");
    assert!(!body.to_string().contains("insufficient funds"));

    let read: AppError = ChainError::Read("connection refused".into()).into();
    let (status, body) = body_json(read).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "chain_read_error");
    assert!(!body.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_database_errors_have_no_details() {
    let (_, body) = body_json(AppError::Database("permission denied on users/abc".into())).await;

    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_mail_errors_do_not_leak_smtp_replies() {
    let (status, body) =
        body_json(AppError::Mail("535 5.7.8 Username and Password not accepted".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "mail_error");
    assert!(!body.to_string().contains("Password"));
}
