// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Binding for the `SystemLogs` contract.
//!
//! The deploy script writes `build/deployed.json` with the contract address
//! and its ABI. We only use the ABI to confirm the functions we call exist
//! with the parameter types we encode.

use crate::error::AppError;
use crate::services::abi::{self, Token};
use crate::services::eth_rpc::{EthRpcClient, RpcError, TransactionRequest};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

pub const ADD_LOG_SIGNATURE: &str = "addLog(string,string)";
pub const GET_LOGS_BY_USER_SIGNATURE: &str = "getLogsByUser(string)";
pub const GET_TOTAL_LOGS_SIGNATURE: &str = "getTotalLogs()";

/// Chain operation failures, split by direction so routes can report them.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("{0}")]
    Write(String),

    #[error("{0}")]
    Read(String),
}

impl From<ChainError> for AppError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Write(msg) => AppError::ChainWrite(msg),
            ChainError::Read(msg) => AppError::ChainRead(msg),
        }
    }
}

/// Errors loading the contract artifact.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Failed to read contract artifact: {0}")]
    Io(String),

    #[error("Failed to parse contract artifact: {0}")]
    Parse(String),

    #[error("Contract ABI has no function {0}")]
    MissingFunction(&'static str),

    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),
}

/// `deployed.json` as written by the deploy script.
#[derive(Debug, Deserialize)]
pub struct ContractArtifact {
    pub address: String,
    #[serde(default)]
    pub abi: Vec<AbiItem>,
}

#[derive(Debug, Deserialize)]
pub struct AbiItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
}

#[derive(Debug, Deserialize)]
pub struct AbiParam {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ContractArtifact {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ContractError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ContractError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::load_from_json(&raw)
    }

    pub fn load_from_json(raw: &str) -> Result<Self, ContractError> {
        serde_json::from_str(raw).map_err(|e| ContractError::Parse(e.to_string()))
    }

    /// Canonical signatures of every function in the ABI.
    pub fn function_signatures(&self) -> Vec<String> {
        self.abi
            .iter()
            .filter(|item| item.kind == "function")
            .map(|item| {
                let params: Vec<&str> = item.inputs.iter().map(|p| p.kind.as_str()).collect();
                format!("{}({})", item.name, params.join(","))
            })
            .collect()
    }

    fn has_function(&self, signature: &str) -> bool {
        self.function_signatures().iter().any(|s| s == signature)
    }
}

/// Typed handle on a deployed `SystemLogs` contract.
#[derive(Clone)]
pub struct SystemLogsContract {
    rpc: Arc<EthRpcClient>,
    address: String,
    has_total_logs: bool,
}

impl SystemLogsContract {
    pub fn new(rpc: Arc<EthRpcClient>, address: impl Into<String>) -> Result<Self, ContractError> {
        let address = address.into();
        if !is_address(&address) {
            return Err(ContractError::InvalidAddress(address));
        }
        Ok(Self {
            rpc,
            address,
            has_total_logs: true,
        })
    }

    /// Bind to the contract described by a build artifact.
    pub fn from_artifact(
        rpc: Arc<EthRpcClient>,
        artifact: &ContractArtifact,
    ) -> Result<Self, ContractError> {
        for required in [ADD_LOG_SIGNATURE, GET_LOGS_BY_USER_SIGNATURE] {
            if !artifact.has_function(required) {
                return Err(ContractError::MissingFunction(required));
            }
        }

        let mut contract = Self::new(rpc, artifact.address.clone())?;
        contract.has_total_logs = artifact.has_function(GET_TOTAL_LOGS_SIGNATURE);
        Ok(contract)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn add_log_calldata(&self, user_id: &str, message: &str) -> Vec<u8> {
        abi::encode_call(
            ADD_LOG_SIGNATURE,
            &[
                Token::String(user_id.to_string()),
                Token::String(message.to_string()),
            ],
        )
    }

    /// Raw JSON strings stored for a user, in contract order.
    pub async fn get_logs_by_user(
        &self,
        from: &str,
        user_id: &str,
    ) -> Result<Vec<String>, ChainError> {
        let calldata = abi::encode_call(
            GET_LOGS_BY_USER_SIGNATURE,
            &[Token::String(user_id.to_string())],
        );
        let tx = TransactionRequest::contract_call(from, &self.address, &calldata);

        let data = self
            .rpc
            .call(&tx)
            .await
            .map_err(|e| ChainError::Read(format!("getLogsByUser call failed: {e}")))?;

        abi::decode_string_array(&data)
            .map_err(|e| ChainError::Read(format!("getLogsByUser returned bad data: {e}")))
    }

    /// Total number of logs across all users, when the contract exposes it.
    pub async fn total_logs(&self, from: &str) -> Result<Option<u128>, ChainError> {
        if !self.has_total_logs {
            return Ok(None);
        }

        let calldata = abi::encode_call(GET_TOTAL_LOGS_SIGNATURE, &[]);
        let tx = TransactionRequest::contract_call(from, &self.address, &calldata);
        let data = self
            .rpc
            .call(&tx)
            .await
            .map_err(|e: RpcError| ChainError::Read(format!("getTotalLogs call failed: {e}")))?;

        abi::decode_uint(&data)
            .map(Some)
            .map_err(|e| ChainError::Read(format!("getTotalLogs returned bad data: {e}")))
    }
}

/// `0x` followed by 40 hex digits.
pub fn is_address(raw: &str) -> bool {
    raw.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
