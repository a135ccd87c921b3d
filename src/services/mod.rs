// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod abi;
pub mod balance;
pub mod capsule_storage;
pub mod contract;
pub mod encoder;
pub mod eth_rpc;
pub mod firebase_auth;
pub mod log_service;
pub mod mailer;
pub mod notifications;
pub mod random;
pub mod sentiment;

pub use balance::{BalanceCheck, BalanceMonitor};
pub use capsule_storage::{CapsuleStorage, StorageError};
pub use contract::{ChainError, ContractArtifact, ContractError, SystemLogsContract};
pub use encoder::{CarrierKind, EncoderError, SteganographyEncoder};
pub use eth_rpc::{EthRpcClient, RpcError};
pub use firebase_auth::{AuthError, FirebaseAuth, FirebaseUser};
pub use log_service::LogService;
pub use mailer::{MailError, Mailer, OutgoingEmail, Outbox};
pub use notifications::{AffirmationRound, AffirmationSender};
pub use sentiment::Sentiment;
