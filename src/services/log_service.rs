// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tamper-evident per-user logs backed by the `SystemLogs` contract.
//!
//! Writes are signed by the node on behalf of a single backend account.
//! Nothing is cached or retried: a failed write is reported to the caller
//! and a failed read returns an error instead of stale data.

use crate::models::log::{parse_log_entries, LogEntry};
use crate::services::contract::{ChainError, SystemLogsContract};
use crate::services::eth_rpc::{parse_quantity, EthRpcClient, TransactionRequest};
use std::sync::Arc;
use std::time::Duration;

/// Gas limit = estimate * 13 / 10, headroom for estimation drift.
const GAS_MARGIN_NUMERATOR: u64 = 13;
const GAS_MARGIN_DENOMINATOR: u64 = 10;

const RECEIPT_POLL_ATTEMPTS: u32 = 20;
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Apply the fixed safety margin to a gas estimate (rounded down).
pub fn gas_with_margin(estimate: u64) -> u64 {
    estimate.saturating_mul(GAS_MARGIN_NUMERATOR) / GAS_MARGIN_DENOMINATOR
}

/// Log read/write operations against the chain.
#[derive(Clone)]
pub struct LogService {
    rpc: Arc<EthRpcClient>,
    contract: SystemLogsContract,
    account: String,
}

impl LogService {
    pub fn new(rpc: Arc<EthRpcClient>, contract: SystemLogsContract, account: String) -> Self {
        Self {
            rpc,
            contract,
            account,
        }
    }

    /// Backend account that signs log writes.
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn contract(&self) -> &SystemLogsContract {
        &self.contract
    }

    /// Append a log line for `user_id`; returns the transaction hash.
    pub async fn record_log(&self, user_id: &str, message: &str) -> Result<String, ChainError> {
        let calldata = self.contract.add_log_calldata(user_id, message);
        let tx = TransactionRequest::contract_call(&self.account, self.contract.address(), &calldata);

        let estimate = self
            .rpc
            .estimate_gas(&tx)
            .await
            .map_err(|e| ChainError::Write(format!("gas estimation failed: {e}")))?;
        let gas = gas_with_margin(estimate);

        let tx_hash = self
            .rpc
            .send_transaction(&tx.with_gas(gas))
            .await
            .map_err(|e| ChainError::Write(format!("transaction submission failed: {e}")))?;

        match self.wait_for_receipt(&tx_hash).await {
            Some(receipt) if receipt.reverted() => {
                return Err(ChainError::Write(format!(
                    "transaction {tx_hash} reverted"
                )));
            }
            Some(receipt) => {
                tracing::info!(
                    user_id,
                    tx_hash = %tx_hash,
                    block = ?receipt
                        .block_number
                        .as_deref()
                        .and_then(|b| parse_quantity(b).ok()),
                    gas_limit = gas,
                    gas_used = ?receipt
                        .gas_used
                        .as_deref()
                        .and_then(|g| parse_quantity(g).ok()),
                    "Log stored on chain"
                );
            }
            None => {
                tracing::warn!(
                    user_id,
                    tx_hash = %tx_hash,
                    "Log transaction submitted but no receipt yet"
                );
            }
        }

        Ok(tx_hash)
    }

    /// All logs for `user_id`, newest first. Malformed entries are skipped.
    pub async fn fetch_logs(&self, user_id: &str) -> Result<Vec<LogEntry>, ChainError> {
        let raw = self
            .contract
            .get_logs_by_user(&self.account, user_id)
            .await?;
        let entries = parse_log_entries(&raw);

        tracing::debug!(
            user_id,
            raw = raw.len(),
            parsed = entries.len(),
            "Fetched logs from chain"
        );

        Ok(entries)
    }

    /// Poll for a receipt; development chains mine instantly so this is short.
    async fn wait_for_receipt(
        &self,
        tx_hash: &str,
    ) -> Option<crate::services::eth_rpc::TransactionReceipt> {
        for attempt in 0..RECEIPT_POLL_ATTEMPTS {
            match self.rpc.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Some(receipt),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, tx_hash, attempt, "Receipt lookup failed");
                    return None;
                }
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
        None
    }
}
