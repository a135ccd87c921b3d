// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{extract::State, routing::post, Json, Router};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use lifesync::config::Config;
use lifesync::db::FirestoreDb;
use lifesync::routes::create_router;
use lifesync::services::abi::{self, Token};
use lifesync::services::eth_rpc::{parse_quantity, to_quantity};
use lifesync::services::{
    CapsuleStorage, EthRpcClient, FirebaseAuth, LogService, Mailer, Outbox, SystemLogsContract,
};
use lifesync::AppState;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

pub const TEST_KID: &str = "lifesync-test-kid";
pub const CONTRACT_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const TX_HASH: &str = "0x8f2a54ad0c1e6b1d3c7b7e6bd1c1f0d8f0b6fbc2d2a8e3c5a9b7d3e2f1a0b9c8";

const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/test_rsa_private.pem");
const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/test_rsa_public.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

// ─── Firebase ID tokens ──────────────────────────────────────

#[derive(Serialize)]
pub struct TestClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: u64,
    pub auth_time: u64,
    pub exp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TestClaims {
    pub fn valid(project_id: &str, uid: &str) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        Self {
            iss: format!("https://securetoken.google.com/{project_id}"),
            aud: project_id.to_string(),
            sub: uid.to_string(),
            iat: now,
            auth_time: now,
            exp: now + 3600,
            name: Some("Test User".to_string()),
        }
    }
}

/// Sign claims with the fixture key, as Firebase Auth would.
#[allow(dead_code)]
pub fn sign_token(claims: &TestClaims) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

#[allow(dead_code)]
pub fn valid_token(uid: &str) -> String {
    sign_token(&TestClaims::valid(
        &Config::test_default().firebase_project_id,
        uid,
    ))
}

pub fn test_verifier(project_id: &str) -> FirebaseAuth {
    let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
    FirebaseAuth::new_with_static_key(project_id, TEST_KID, key).unwrap()
}

// ─── Mock Ethereum node ──────────────────────────────────────

/// Scripted node behavior plus a record of every call.
pub struct NodeScript {
    pub accounts: Vec<String>,
    pub balance_wei: u128,
    pub gas_estimate: u64,
    /// Raw strings returned by `getLogsByUser`
    pub logs: Vec<String>,
    pub fail_estimate: bool,
    pub revert: bool,
    pub calls: Vec<(String, Value)>,
}

impl Default for NodeScript {
    fn default() -> Self {
        Self {
            accounts: vec![
                Config::test_default().backend_account.unwrap(),
                "0x00000000000000000000000000000000000000bb".to_string(),
            ],
            balance_wei: 500 * lifesync::config::WEI_PER_ETHER,
            gas_estimate: 100_000,
            logs: Vec::new(),
            fail_estimate: false,
            revert: false,
            calls: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct MockNode {
    pub url: String,
    pub script: Arc<Mutex<NodeScript>>,
}

impl MockNode {
    pub async fn start(script: NodeScript) -> Self {
        let script = Arc::new(Mutex::new(script));
        let app = Router::new()
            .route("/", post(handle_rpc))
            .with_state(script.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            script,
        }
    }

    #[allow(dead_code)]
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }

    #[allow(dead_code)]
    pub fn balance(&self) -> u128 {
        self.script.lock().unwrap().balance_wei
    }
}

async fn handle_rpc(
    State(script): State<Arc<Mutex<NodeScript>>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let id = body["id"].clone();
    let method = body["method"].as_str().unwrap_or_default().to_string();
    let params = body["params"].clone();

    let mut s = script.lock().unwrap();
    s.calls.push((method.clone(), params.clone()));

    let outcome: Result<Value, &str> = match method.as_str() {
        "eth_accounts" => Ok(json!(s.accounts)),
        "eth_getBalance" => Ok(json!(to_quantity(s.balance_wei))),
        "eth_estimateGas" if s.fail_estimate => Err("sender doesn't have enough funds to send tx"),
        "eth_estimateGas" => Ok(json!(to_quantity(s.gas_estimate as u128))),
        "eth_sendTransaction" => {
            if let Some(value) = params[0]["value"].as_str() {
                let amount = parse_quantity(value).unwrap();
                s.balance_wei += amount;
            }
            Ok(json!(TX_HASH))
        }
        "eth_getTransactionReceipt" => Ok(json!({
            "transactionHash": TX_HASH,
            "blockNumber": "0x2a",
            "gasUsed": "0x15f90",
            "status": if s.revert { "0x0" } else { "0x1" },
        })),
        "eth_call" => {
            let encoded = abi::encode(&[Token::StringArray(s.logs.clone())]);
            Ok(json!(format!("0x{}", hex::encode(encoded))))
        }
        "evm_setAccountBalance" | "hardhat_setBalance" => {
            let target = params[1].as_str().unwrap_or("0x0");
            s.balance_wei = parse_quantity(target).unwrap();
            Ok(json!(true))
        }
        _ => Err("method not found"),
    };

    Json(match outcome {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(message) => json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32000, "message": message}}),
    })
}

// ─── App ─────────────────────────────────────────────────────

/// Test app with an offline database, static-key auth, and the given node.
#[allow(dead_code)]
pub fn create_test_app(node_url: &str) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(node_url, FirestoreDb::new_mock())
}

#[allow(dead_code)]
pub fn create_test_app_with_db(node_url: &str, db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    build_test_app(node_url, db, None)
}

/// Test app whose outgoing mail lands in the returned outbox.
#[allow(dead_code)]
pub fn create_test_app_with_mailer(db: FirestoreDb) -> (axum::Router, Arc<AppState>, Outbox) {
    let (mailer, outbox) = Mailer::capture("LifeSync <noreply@lifesync.test>").unwrap();
    let (app, state) = build_test_app(UNREACHABLE_NODE, db, Some(mailer));
    (app, state, outbox)
}

fn build_test_app(
    node_url: &str,
    db: FirestoreDb,
    mailer: Option<Mailer>,
) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.eth_rpc_url = node_url.to_string();
    config.uploads_dir =
        std::env::temp_dir().join(format!("lifesync-uploads-{}", uuid::Uuid::new_v4()));

    let rpc = Arc::new(EthRpcClient::new(node_url).unwrap());
    let contract = SystemLogsContract::new(rpc.clone(), CONTRACT_ADDRESS).unwrap();
    let account = config.backend_account.clone().unwrap();

    let state = Arc::new(AppState {
        auth: Arc::new(test_verifier(&config.firebase_project_id)),
        logs: LogService::new(rpc, contract, account),
        capsules: CapsuleStorage::new(&config.uploads_dir),
        encoder: None,
        mailer,
        db,
        config,
    });

    (create_router(state.clone()), state)
}

/// Base URL for tests that never reach the node.
#[allow(dead_code)]
pub const UNREACHABLE_NODE: &str = "http://127.0.0.1:9";
