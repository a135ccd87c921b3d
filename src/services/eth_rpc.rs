// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Minimal Ethereum JSON-RPC client.
//!
//! Only the handful of methods the log service and balance monitor need.
//! Transactions are sent with `eth_sendTransaction`, so the node must hold
//! the backend account unlocked (Ganache/Hardhat development chains do).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC failure categories.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    /// Node unreachable, timed out, or returned a non-JSON body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    /// The result field did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Transaction / call object for `eth_call`, `eth_estimateGas` and
/// `eth_sendTransaction`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl TransactionRequest {
    /// A contract call carrying ABI-encoded calldata.
    pub fn contract_call(from: &str, to: &str, calldata: &[u8]) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            data: Some(format!("0x{}", hex::encode(calldata))),
            gas: None,
            value: None,
        }
    }

    /// A plain value transfer.
    pub fn transfer(from: &str, to: &str, value_wei: u128) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            data: None,
            gas: None,
            value: Some(to_quantity(value_wei)),
        }
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(to_quantity(gas as u128));
        self
    }
}

/// Subset of a transaction receipt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: Option<String>,
    pub block_number: Option<String>,
    pub gas_used: Option<String>,
    /// `0x1` success, `0x0` revert (post-Byzantium nodes only)
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn reverted(&self) -> bool {
        self.status
            .as_deref()
            .and_then(|s| parse_quantity(s).ok())
            .is_some_and(|s| s == 0)
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Ethereum JSON-RPC client over HTTP.
pub struct EthRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl EthRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed building HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue a raw JSON-RPC request and deserialize its `result`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "JSON-RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("{method}: {e}")))?;

        if !response.status().is_success() {
            return Err(RpcError::Transport(format!(
                "{method}: HTTP status {}",
                response.status()
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Transport(format!("{method}: invalid JSON body: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(RpcError::Node {
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(envelope.result)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }

    pub async fn accounts(&self) -> Result<Vec<String>, RpcError> {
        self.request("eth_accounts", json!([])).await
    }

    pub async fn get_balance(&self, account: &str) -> Result<u128, RpcError> {
        let raw: String = self
            .request("eth_getBalance", json!([account, "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RpcError> {
        let raw: String = self.request("eth_estimateGas", json!([tx])).await?;
        let gas = parse_quantity(&raw)?;
        u64::try_from(gas).map_err(|_| RpcError::InvalidResponse(format!("gas overflow: {raw}")))
    }

    /// Submit a transaction from an unlocked account; returns the tx hash.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, RpcError> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    /// Execute a read-only call; returns the raw return data.
    pub async fn call(&self, tx: &TransactionRequest) -> Result<Vec<u8>, RpcError> {
        let raw: String = self.request("eth_call", json!([tx, "latest"])).await?;
        hex::decode(raw.trim_start_matches("0x"))
            .map_err(|e| RpcError::InvalidResponse(format!("eth_call hex: {e}")))
    }

    /// `None` while the transaction is still pending.
    pub async fn transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        self.request("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }
}

/// Encode an integer as a JSON-RPC quantity (`0x`-prefixed, no leading zeros).
pub fn to_quantity(value: u128) -> String {
    format!("0x{value:x}")
}

/// Parse a JSON-RPC quantity. `0x` alone is zero.
pub fn parse_quantity(raw: &str) -> Result<u128, RpcError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::InvalidResponse(format!("quantity without 0x prefix: {raw}")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("bad quantity {raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_round_trip_edges() {
        assert_eq!(to_quantity(0), "0x0");
        assert_eq!(to_quantity(1_000), "0x3e8");
        assert_eq!(parse_quantity("0x").unwrap(), 0);
        assert_eq!(parse_quantity("0x3635c9adc5dea00000").unwrap(), 1000 * 10u128.pow(18));
        assert!(parse_quantity("1234").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn transaction_request_skips_unset_fields() {
        let tx = TransactionRequest::contract_call("0xaa", "0xbb", &[0xde, 0xad]).with_gas(21_000);
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["data"], "0xdead");
        assert_eq!(value["gas"], "0x5208");
        assert!(value.get("value").is_none());
    }

    #[test]
    fn receipt_revert_detection() {
        let receipt: TransactionReceipt =
            serde_json::from_value(json!({ "status": "0x0", "blockNumber": "0x5" })).unwrap();
        assert!(receipt.reverted());

        let receipt: TransactionReceipt =
            serde_json::from_value(json!({ "status": "0x1" })).unwrap();
        assert!(!receipt.reverted());

        let receipt: TransactionReceipt = serde_json::from_value(json!({})).unwrap();
        assert!(!receipt.reverted());
    }
}
