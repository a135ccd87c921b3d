// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend account balance maintenance.
//!
//! Local development chains hand out finite test ether, and every log write
//! burns some. A background task checks the balance at startup and then on a
//! fixed interval; below the threshold it restores funds and carries on.

use crate::config::{BalanceRemediation, Config, WEI_PER_ETHER};
use crate::services::contract::ChainError;
use crate::services::eth_rpc::{to_quantity, EthRpcClient, TransactionRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Outcome of one balance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceCheck {
    Healthy { balance_wei: u128 },
    Remediated { before_wei: u128, after_wei: u128 },
}

/// Periodic balance check with conditional remediation.
#[derive(Clone)]
pub struct BalanceMonitor {
    rpc: Arc<EthRpcClient>,
    account: String,
    threshold_wei: u128,
    target_wei: u128,
    remediation: BalanceRemediation,
}

impl BalanceMonitor {
    pub fn new(rpc: Arc<EthRpcClient>, account: String, config: &Config) -> Self {
        Self {
            rpc,
            account,
            threshold_wei: config.balance_threshold_wei,
            target_wei: config.balance_target_wei,
            remediation: config.balance_remediation.clone(),
        }
    }

    /// Read the balance and remediate if it is below the threshold.
    pub async fn check_and_remediate(&self) -> Result<BalanceCheck, ChainError> {
        let balance_wei = self.balance().await?;

        if balance_wei >= self.threshold_wei {
            tracing::info!(
                account = %self.account,
                balance_eth = %format_ether(balance_wei),
                "Backend account balance ok"
            );
            return Ok(BalanceCheck::Healthy { balance_wei });
        }

        tracing::warn!(
            account = %self.account,
            balance_eth = %format_ether(balance_wei),
            threshold_eth = %format_ether(self.threshold_wei),
            "Low backend account balance, remediating"
        );

        match &self.remediation {
            BalanceRemediation::Reset { rpc_method } => self.reset(rpc_method).await?,
            BalanceRemediation::TopUp { funder } => {
                self.top_up(funder.as_deref(), balance_wei).await?
            }
        }

        let after_wei = self.balance().await?;
        tracing::info!(
            account = %self.account,
            balance_eth = %format_ether(after_wei),
            "Backend account balance restored"
        );

        Ok(BalanceCheck::Remediated {
            before_wei: balance_wei,
            after_wei,
        })
    }

    /// Run a check now and then every `period`. Failures are logged only.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately: the startup check.
                ticker.tick().await;
                if let Err(e) = self.check_and_remediate().await {
                    tracing::error!(error = %e, account = %self.account, "Balance check failed");
                }
            }
        })
    }

    async fn balance(&self) -> Result<u128, ChainError> {
        self.rpc
            .get_balance(&self.account)
            .await
            .map_err(|e| ChainError::Read(format!("eth_getBalance failed: {e}")))
    }

    async fn reset(&self, rpc_method: &str) -> Result<(), ChainError> {
        let _: Value = self
            .rpc
            .request(
                rpc_method,
                json!([self.account, to_quantity(self.target_wei)]),
            )
            .await
            .map_err(|e| ChainError::Write(format!("{rpc_method} failed: {e}")))?;
        Ok(())
    }

    async fn top_up(&self, funder: Option<&str>, balance_wei: u128) -> Result<(), ChainError> {
        let funder = match funder {
            Some(f) => f.to_string(),
            None => self.default_funder().await?,
        };
        let amount = self.target_wei.saturating_sub(balance_wei);

        let tx_hash = self
            .rpc
            .send_transaction(&TransactionRequest::transfer(&funder, &self.account, amount))
            .await
            .map_err(|e| ChainError::Write(format!("top-up transfer failed: {e}")))?;

        tracing::info!(
            funder = %funder,
            amount_eth = %format_ether(amount),
            tx_hash = %tx_hash,
            "Top-up transfer submitted"
        );
        Ok(())
    }

    /// First unlocked node account other than the backend account.
    async fn default_funder(&self) -> Result<String, ChainError> {
        let accounts = self
            .rpc
            .accounts()
            .await
            .map_err(|e| ChainError::Read(format!("eth_accounts failed: {e}")))?;

        accounts
            .into_iter()
            .find(|a| !a.eq_ignore_ascii_case(&self.account))
            .ok_or_else(|| ChainError::Write("no funder account available".to_string()))
    }
}

/// Render wei as a decimal ether amount without trailing zeros.
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let frac = wei % WEI_PER_ETHER;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
