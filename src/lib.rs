// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! LifeSync: backend API for a mental-wellness companion app
//!
//! This crate serves journaling, progress tracking, chat history and time
//! capsules, and keeps a tamper-evident per-user activity log on an
//! Ethereum-compatible chain. Opted-in users also get affirmation emails.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{CapsuleStorage, FirebaseAuth, LogService, Mailer, SteganographyEncoder};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub auth: Arc<FirebaseAuth>,
    pub logs: LogService,
    pub capsules: CapsuleStorage,
    /// Unset when no steganography command is configured
    pub encoder: Option<SteganographyEncoder>,
    /// Unset when no SMTP account is configured
    pub mailer: Option<Mailer>,
}
