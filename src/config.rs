// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything has a local-development default except the Firebase project,
//! which must match the project that issues the ID tokens we accept.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// One ether in wei.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// How the balance monitor restores funds on a development chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceRemediation {
    /// Overwrite the account balance with a node cheat-code RPC
    /// (`evm_setAccountBalance` on Ganache, `hardhat_setBalance` on Hardhat).
    Reset { rpc_method: String },
    /// Transfer funds from another unlocked node account.
    TopUp { funder: Option<String> },
}

/// Outgoing mail server. Unset disables verification codes and affirmations.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// `From` mailbox, e.g. `LifeSync <noreply@example.com>`
    pub from: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Firebase project that issues user ID tokens (also the Firestore project)
    pub firebase_project_id: String,

    // --- Chain ---
    /// Ethereum JSON-RPC endpoint
    pub eth_rpc_url: String,
    /// Path to the `deployed.json` artifact written by the deploy script
    pub contract_artifact: PathBuf,
    /// Backend account; defaults to the node's first account when unset
    pub backend_account: Option<String>,

    // --- Balance maintenance ---
    pub balance_threshold_wei: u128,
    pub balance_target_wei: u128,
    pub balance_check_interval: Duration,
    pub balance_remediation: BalanceRemediation,

    // --- Time capsules ---
    pub uploads_dir: PathBuf,
    /// External steganography encoder; capsules asking for it are rejected when unset
    pub steganography_command: Option<String>,
    pub encoder_timeout: Duration,

    // --- Email ---
    pub smtp: Option<SmtpConfig>,
    /// Public app URL used for links in outgoing mail
    pub app_url: String,
    pub affirmation_interval: Duration,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 5011,
            frontend_url: "http://localhost:5173".to_string(),
            firebase_project_id: "lifesync-test".to_string(),
            eth_rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_artifact: PathBuf::from("Contracts/build/deployed.json"),
            backend_account: Some("0x00000000000000000000000000000000000000aa".to_string()),
            balance_threshold_wei: 50 * WEI_PER_ETHER,
            balance_target_wei: 1000 * WEI_PER_ETHER,
            balance_check_interval: Duration::from_secs(600),
            balance_remediation: BalanceRemediation::Reset {
                rpc_method: "evm_setAccountBalance".to_string(),
            },
            uploads_dir: std::env::temp_dir().join("lifesync-test-uploads"),
            steganography_command: None,
            encoder_timeout: Duration::from_secs(5),
            smtp: None,
            app_url: "http://localhost:5173".to_string(),
            affirmation_interval: Duration::from_secs(7 * 24 * 3600),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let balance_remediation = match env::var("BALANCE_REMEDIATION")
            .unwrap_or_else(|_| "reset".to_string())
            .as_str()
        {
            "reset" => BalanceRemediation::Reset {
                rpc_method: env::var("BALANCE_RESET_METHOD")
                    .unwrap_or_else(|_| "evm_setAccountBalance".to_string()),
            },
            "topup" => BalanceRemediation::TopUp {
                funder: non_empty_var("BALANCE_FUNDER_ACCOUNT"),
            },
            _ => return Err(ConfigError::Invalid("BALANCE_REMEDIATION")),
        };

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let smtp = match (non_empty_var("EMAIL_USER"), non_empty_var("EMAIL_PASS")) {
            (Some(username), Some(password)) => Some(SmtpConfig {
                host: non_empty_var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                port: parse_var("SMTP_PORT", 465)?,
                from: non_empty_var("MAIL_FROM")
                    .unwrap_or_else(|| format!("LifeSync <{username}>")),
                username,
                password,
            }),
            (None, None) => None,
            (None, Some(_)) => return Err(ConfigError::Missing("EMAIL_USER")),
            (Some(_), None) => return Err(ConfigError::Missing("EMAIL_PASS")),
        };

        Ok(Self {
            port: parse_var("PORT", 5011)?,
            app_url: non_empty_var("APP_URL").unwrap_or_else(|| frontend_url.clone()),
            frontend_url,
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?,

            eth_rpc_url: env::var("ETH_RPC_URL")
                .unwrap_or_else(|_| "http://localhost:8545".to_string()),
            contract_artifact: env::var("CONTRACT_ARTIFACT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("Contracts/build/deployed.json")),
            backend_account: non_empty_var("BACKEND_ACCOUNT"),

            balance_threshold_wei: parse_var::<u128>("BALANCE_THRESHOLD_ETH", 50)?
                .saturating_mul(WEI_PER_ETHER),
            balance_target_wei: parse_var::<u128>("BALANCE_TARGET_ETH", 1000)?
                .saturating_mul(WEI_PER_ETHER),
            balance_check_interval: Duration::from_secs(parse_var(
                "BALANCE_CHECK_INTERVAL_SECS",
                600,
            )?),
            balance_remediation,

            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            steganography_command: non_empty_var("STEGANOGRAPHY_COMMAND"),
            encoder_timeout: Duration::from_secs(parse_var("ENCODER_TIMEOUT_SECS", 120)?),

            smtp,
            affirmation_interval: Duration::from_secs(parse_var(
                "AFFIRMATION_INTERVAL_SECS",
                7 * 24 * 3600,
            )?),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("FIREBASE_PROJECT_ID", "lifesync-dev");
        env::set_var("BALANCE_THRESHOLD_ETH", "25");
        env::set_var("BALANCE_REMEDIATION", "topup");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_project_id, "lifesync-dev");
        assert_eq!(config.balance_threshold_wei, 25 * WEI_PER_ETHER);
        assert_eq!(config.balance_target_wei, 1000 * WEI_PER_ETHER);
        assert!(matches!(
            config.balance_remediation,
            BalanceRemediation::TopUp { .. }
        ));

        env::remove_var("BALANCE_THRESHOLD_ETH");
        env::remove_var("BALANCE_REMEDIATION");
    }

    #[test]
    fn smtp_password_not_in_debug_output() {
        let smtp = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 465,
            username: "mailer@example.com".to_string(),
            password: "hunter2".to_string(),
            from: "LifeSync <mailer@example.com>".to_string(),
        };
        let shown = format!("{smtp:?}");
        assert!(shown.contains("smtp.example.com"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn parse_var_rejects_garbage() {
        env::set_var("LIFESYNC_TEST_PORT_GARBAGE", "not-a-port");
        let result: Result<u16, _> = parse_var("LIFESYNC_TEST_PORT_GARBAGE", 1);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
