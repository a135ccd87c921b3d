// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tamper-evident log routes against a scripted JSON-RPC node.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use lifesync::services::abi;
use lifesync::services::contract::ADD_LOG_SIGNATURE;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{MockNode, NodeScript, TestClaims, TX_HASH};

fn post_log(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/log")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_logs(token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/api/logs")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_token_is_401_and_chain_untouched() {
    let node = MockNode::start(NodeScript::default()).await;
    let (app, _) = common::create_test_app(&node.url);

    let response = app
        .oneshot(post_log(None, json!({"message": "User Logged In"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(node.call_count(), 0);
}

#[tokio::test]
async fn invalid_tokens_are_403_and_chain_untouched() {
    let node = MockNode::start(NodeScript::default()).await;
    let (app, state) = common::create_test_app(&node.url);
    let project = state.config.firebase_project_id.clone();

    let mut wrong_audience = TestClaims::valid(&project, "uid-1");
    wrong_audience.aud = "some-other-project".to_string();

    let mut expired = TestClaims::valid(&project, "uid-1");
    expired.exp -= 7200;

    let mut wrong_issuer = TestClaims::valid(&project, "uid-1");
    wrong_issuer.iss = "https://accounts.google.com".to_string();

    let tokens = [
        "not.a.jwt".to_string(),
        common::sign_token(&wrong_audience),
        common::sign_token(&expired),
        common::sign_token(&wrong_issuer),
    ];

    for token in tokens {
        let response = app
            .clone()
            .oneshot(post_log(Some(&token), json!({"message": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["error"], "invalid_token");
    }
    assert_eq!(node.call_count(), 0);
}

#[tokio::test]
async fn record_log_uses_gas_margin_and_returns_tx_hash() {
    let node = MockNode::start(NodeScript {
        gas_estimate: 100_000,
        ..NodeScript::default()
    })
    .await;
    let (app, state) = common::create_test_app(&node.url);
    let token = common::valid_token("uid-42");

    let response = app
        .oneshot(post_log(
            Some(&token),
            json!({"message": "Visited /dashboard"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["txHash"], TX_HASH);
    assert!(body["message"].is_string());

    let sends = node.calls("eth_sendTransaction");
    assert_eq!(sends.len(), 1);
    let tx = &sends[0][0];
    // 100_000 * 1.3
    assert_eq!(tx["gas"], "0x1fbd0");
    assert_eq!(tx["from"], state.config.backend_account.clone().unwrap());
    assert_eq!(tx["to"], common::CONTRACT_ADDRESS);

    let selector = hex::encode(abi::selector(ADD_LOG_SIGNATURE));
    let data = tx["data"].as_str().unwrap();
    assert!(data.starts_with(&format!("0x{selector}")));
    // userId comes from the token, not the body
    assert!(data.contains(&hex::encode("uid-42")));
}

#[tokio::test]
async fn empty_message_is_400() {
    let node = MockNode::start(NodeScript::default()).await;
    let (app, _) = common::create_test_app(&node.url);
    let token = common::valid_token("uid-1");

    for body in [json!({"message": ""}), json!({"message": "   "}), json!({})] {
        let response = app
            .clone()
            .oneshot(post_log(Some(&token), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(node.call_count(), 0);
}

#[tokio::test]
async fn message_is_stored_untrimmed() {
    let node = MockNode::start(NodeScript::default()).await;
    let (app, _) = common::create_test_app(&node.url);
    let token = common::valid_token("uid-1");

    let response = app
        .oneshot(post_log(Some(&token), json!({"message": "  padded line\n"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let sends = node.calls("eth_sendTransaction");
    assert_eq!(sends.len(), 1);
    let data = sends[0][0]["data"].as_str().unwrap();
    assert!(data.contains(&hex::encode("  padded line\n")));
}

#[tokio::test]
async fn estimate_failure_is_500_without_node_details() {
    let node = MockNode::start(NodeScript {
        fail_estimate: true,
        ..NodeScript::default()
    })
    .await;
    let (app, _) = common::create_test_app(&node.url);
    let token = common::valid_token("uid-1");

    let response = app
        .oneshot(post_log(Some(&token), json!({"message": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "chain_write_error");
    assert!(!body.to_string().contains("enough funds"));
    assert!(node.calls("eth_sendTransaction").is_empty());
}

#[tokio::test]
async fn reverted_transaction_is_500() {
    let node = MockNode::start(NodeScript {
        revert: true,
        ..NodeScript::default()
    })
    .await;
    let (app, _) = common::create_test_app(&node.url);
    let token = common::valid_token("uid-1");

    let response = app
        .oneshot(post_log(Some(&token), json!({"message": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn get_logs_drops_malformed_and_sorts_newest_first() {
    let node = MockNode::start(NodeScript {
        logs: vec![
            r#"{"userId":"uid-7","message":"User Logged In","timestamp":1700000000}"#.to_string(),
            "{broken".to_string(),
            r#"{"userId":"uid-7","message":"Visited /journal","timestamp":1700000300}"#.to_string(),
            r#"{"userId":"uid-7","message":"Visited /progress","timestamp":"1700000100"}"#
                .to_string(),
        ],
        ..NodeScript::default()
    })
    .await;
    let (app, _) = common::create_test_app(&node.url);
    let token = common::valid_token("uid-7");

    let response = app.oneshot(get_logs(&token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["message"], "Visited /journal");
    assert_eq!(entries[1]["message"], "Visited /progress");
    assert_eq!(entries[2]["message"], "User Logged In");
    assert_eq!(entries[0]["timestamp"], 1700000300);
    // Quoted timestamps read back as stored
    assert_eq!(entries[1]["timestamp"], "1700000100");

    let calls = node.calls("eth_call");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0]["to"], common::CONTRACT_ADDRESS);
}

#[tokio::test]
async fn get_logs_with_node_down_is_500() {
    let (app, _) = common::create_test_app(common::UNREACHABLE_NODE);
    let token = common::valid_token("uid-1");

    let response = app.oneshot(get_logs(&token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "chain_read_error");
}
