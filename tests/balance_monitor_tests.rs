// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend account balance maintenance against a scripted node.

use lifesync::config::{BalanceRemediation, Config, WEI_PER_ETHER};
use lifesync::services::balance::BalanceCheck;
use lifesync::services::{BalanceMonitor, EthRpcClient};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{MockNode, NodeScript};

fn monitor(node: &MockNode, remediation: BalanceRemediation) -> (BalanceMonitor, Config) {
    let mut config = Config::test_default();
    config.balance_remediation = remediation;
    let rpc = Arc::new(EthRpcClient::new(&node.url).unwrap());
    let account = config.backend_account.clone().unwrap();
    (BalanceMonitor::new(rpc, account, &config), config)
}

#[tokio::test]
async fn low_balance_is_reset_to_target() {
    let node = MockNode::start(NodeScript {
        balance_wei: 10 * WEI_PER_ETHER,
        ..NodeScript::default()
    })
    .await;
    let (monitor, config) = monitor(
        &node,
        BalanceRemediation::Reset {
            rpc_method: "evm_setAccountBalance".to_string(),
        },
    );

    let outcome = monitor.check_and_remediate().await.unwrap();

    assert_eq!(
        outcome,
        BalanceCheck::Remediated {
            before_wei: 10 * WEI_PER_ETHER,
            after_wei: 1000 * WEI_PER_ETHER,
        }
    );

    let resets = node.calls("evm_setAccountBalance");
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0][0], config.backend_account.unwrap());
    // 1000 ether
    assert_eq!(resets[0][1], "0x3635c9adc5dea00000");
    assert!(node.calls("eth_sendTransaction").is_empty());
}

#[tokio::test]
async fn healthy_balance_is_left_alone() {
    let node = MockNode::start(NodeScript {
        balance_wei: 500 * WEI_PER_ETHER,
        ..NodeScript::default()
    })
    .await;
    let (monitor, _) = monitor(
        &node,
        BalanceRemediation::Reset {
            rpc_method: "evm_setAccountBalance".to_string(),
        },
    );

    let outcome = monitor.check_and_remediate().await.unwrap();

    assert_eq!(
        outcome,
        BalanceCheck::Healthy {
            balance_wei: 500 * WEI_PER_ETHER
        }
    );
    assert_eq!(node.call_count(), 1);
    assert_eq!(node.calls("eth_getBalance").len(), 1);
}

#[tokio::test]
async fn balance_at_threshold_is_healthy() {
    let node = MockNode::start(NodeScript {
        balance_wei: 50 * WEI_PER_ETHER,
        ..NodeScript::default()
    })
    .await;
    let (monitor, _) = monitor(
        &node,
        BalanceRemediation::Reset {
            rpc_method: "hardhat_setBalance".to_string(),
        },
    );

    let outcome = monitor.check_and_remediate().await.unwrap();

    assert!(matches!(outcome, BalanceCheck::Healthy { .. }));
    assert!(node.calls("hardhat_setBalance").is_empty());
}

#[tokio::test]
async fn top_up_transfers_difference_from_other_account() {
    let node = MockNode::start(NodeScript {
        balance_wei: 10 * WEI_PER_ETHER,
        ..NodeScript::default()
    })
    .await;
    let (monitor, config) = monitor(&node, BalanceRemediation::TopUp { funder: None });

    let outcome = monitor.check_and_remediate().await.unwrap();

    let sends = node.calls("eth_sendTransaction");
    assert_eq!(sends.len(), 1);
    let tx = &sends[0][0];
    assert_eq!(tx["from"], "0x00000000000000000000000000000000000000bb");
    assert_eq!(tx["to"], config.backend_account.unwrap());
    // 990 ether
    assert_eq!(tx["value"], "0x35ab028ac154b80000");

    assert_eq!(
        outcome,
        BalanceCheck::Remediated {
            before_wei: 10 * WEI_PER_ETHER,
            after_wei: 1000 * WEI_PER_ETHER,
        }
    );
    assert_eq!(node.balance(), 1000 * WEI_PER_ETHER);
}

#[tokio::test]
async fn node_down_is_read_error() {
    let config = Config::test_default();
    let rpc = Arc::new(EthRpcClient::new(common::UNREACHABLE_NODE).unwrap());
    let monitor = BalanceMonitor::new(rpc, config.backend_account.clone().unwrap(), &config);

    let result = monitor.check_and_remediate().await;

    assert!(matches!(
        result,
        Err(lifesync::services::contract::ChainError::Read(_))
    ));
}

/// Wait until the node has seen `count` calls to `method`, or fail after `limit`.
async fn wait_for_calls(node: &MockNode, method: &str, count: usize, limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    while node.calls(method).len() < count {
        assert!(
            tokio::time::Instant::now() < deadline,
            "saw {} {method} calls, wanted {count}",
            node.calls(method).len()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// The mock node answers over real sockets, so these run on the real clock
// with short periods rather than a paused one.

#[tokio::test]
async fn spawned_monitor_checks_once_at_startup() {
    let node = MockNode::start(NodeScript::default()).await;
    let (monitor, _) = monitor(
        &node,
        BalanceRemediation::Reset {
            rpc_method: "evm_setAccountBalance".to_string(),
        },
    );

    let handle = monitor.spawn(Duration::from_secs(3600));
    wait_for_calls(&node, "eth_getBalance", 1, Duration::from_secs(5)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.abort();

    assert_eq!(node.calls("eth_getBalance").len(), 1);
}

#[tokio::test]
async fn spawned_monitor_repeats_every_period() {
    let node = MockNode::start(NodeScript {
        balance_wei: 10 * WEI_PER_ETHER,
        ..NodeScript::default()
    })
    .await;
    let (monitor, _) = monitor(
        &node,
        BalanceRemediation::Reset {
            rpc_method: "evm_setAccountBalance".to_string(),
        },
    );

    let handle = monitor.spawn(Duration::from_millis(100));
    wait_for_calls(&node, "eth_getBalance", 2, Duration::from_secs(5)).await;
    handle.abort();

    // The startup tick restores the balance; later ticks find it healthy.
    assert_eq!(node.calls("evm_setAccountBalance").len(), 1);
    assert_eq!(node.balance(), 1000 * WEI_PER_ETHER);
}
