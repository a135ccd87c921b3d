// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LifeSync API Server
//!
//! Serves the wellness app's REST API and writes tamper-evident activity
//! logs to the `SystemLogs` contract on a local Ethereum node.

use lifesync::{
    config::Config,
    db::FirestoreDb,
    services::{
        AffirmationSender, BalanceMonitor, CapsuleStorage, ContractArtifact, EthRpcClient,
        FirebaseAuth, LogService, Mailer, SteganographyEncoder, SystemLogsContract,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting LifeSync API");

    let db = FirestoreDb::new(&config.firebase_project_id).await?;

    let auth = Arc::new(FirebaseAuth::new(&config.firebase_project_id)?);

    // Chain binding
    let rpc = Arc::new(EthRpcClient::new(&config.eth_rpc_url)?);
    tracing::info!(
        path = %config.contract_artifact.display(),
        "Loading contract artifact"
    );
    let artifact = ContractArtifact::load_from_file(&config.contract_artifact)?;
    let contract = SystemLogsContract::from_artifact(rpc.clone(), &artifact)?;

    let account = match &config.backend_account {
        Some(account) => account.clone(),
        None => rpc
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or("node reported no accounts; set BACKEND_ACCOUNT")?,
    };
    tracing::info!(
        rpc_url = %config.eth_rpc_url,
        contract = %contract.address(),
        account = %account,
        "Contract binding ready"
    );

    match contract.total_logs(&account).await {
        Ok(Some(total)) => tracing::info!(total, "SystemLogs reachable"),
        Ok(None) => tracing::debug!("SystemLogs has no getTotalLogs(); skipping count"),
        Err(e) => tracing::warn!(error = %e, "SystemLogs not reachable at startup"),
    }

    BalanceMonitor::new(rpc.clone(), account.clone(), &config)
        .spawn(config.balance_check_interval);

    let logs = LogService::new(rpc, contract, account);

    let capsules = CapsuleStorage::new(&config.uploads_dir);
    capsules.ensure_dir().await?;

    let encoder = match &config.steganography_command {
        Some(command) => Some(SteganographyEncoder::new(command, config.encoder_timeout)?),
        None => {
            tracing::info!("STEGANOGRAPHY_COMMAND unset; hidden-message capsules disabled");
            None
        }
    };

    let mailer = match &config.smtp {
        Some(smtp) => {
            let mailer = Mailer::smtp(smtp)?;
            AffirmationSender::new(db.clone(), mailer.clone(), &config.app_url)
                .spawn(config.affirmation_interval);
            Some(mailer)
        }
        None => {
            tracing::info!("EMAIL_USER unset; verification codes and affirmations disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        auth,
        logs,
        capsules,
        encoder,
        mailer,
    });

    let app = lifesync::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lifesync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
