// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verification-code mail and scheduled affirmations.
//!
//! Users who turn on email notifications get one randomly chosen
//! affirmation per round. Rounds run on a fixed interval starting one
//! interval after startup, so restarts don't re-send.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Affirmation, VerificationCode};
use crate::services::mailer::{escape_html, Mailer, OutgoingEmail};
use crate::services::random::random_index;
use crate::time_utils::parse_rfc3339;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long a verification code stays valid.
pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;

/// Wrong guesses allowed before a code is discarded.
pub const MAX_VERIFICATION_ATTEMPTS: u32 = 5;

pub fn verification_email(to: &str, code: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Your LifeSync Verification Code".to_string(),
        text: format!(
            "Your verification code is {code}. It expires in {VERIFICATION_CODE_TTL_MINUTES} minutes."
        ),
        html: format!(
            "<p>Your verification code is <strong>{code}</strong>.</p>\
             <p>It expires in {VERIFICATION_CODE_TTL_MINUTES} minutes. \
             If you didn't ask for it, you can ignore this email.</p>"
        ),
    }
}

pub fn affirmation_email(to: &str, affirmation: &Affirmation, app_url: &str) -> OutgoingEmail {
    let preferences_url = format!("{}/preferences", app_url.trim_end_matches('/'));
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("Weekly Affirmation on {}", affirmation.category),
        text: format!(
            "{}\n\nYou're receiving this email because you enabled notifications. \
             Update your preferences at {preferences_url}",
            affirmation.text
        ),
        html: format!(
            "<p>{}</p><p><small>You're receiving this email because you enabled notifications. \
             <a href=\"{}\">Update preferences</a></small></p>",
            escape_html(&affirmation.text),
            escape_html(&preferences_url)
        ),
    }
}

/// Result of checking a submitted code against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Valid,
    /// Wrong code; the stored one is still usable.
    Mismatch,
    /// Expired, unreadable, or out of attempts; the stored one should go.
    Spent,
}

pub fn check_code(stored: &VerificationCode, submitted: &str, now: DateTime<Utc>) -> CodeCheck {
    let expired = match parse_rfc3339(&stored.expires_at) {
        Some(expires_at) => now >= expires_at,
        None => true,
    };
    if expired || stored.attempts >= MAX_VERIFICATION_ATTEMPTS {
        return CodeCheck::Spent;
    }
    if stored.code == submitted.trim() {
        CodeCheck::Valid
    } else if stored.attempts + 1 >= MAX_VERIFICATION_ATTEMPTS {
        CodeCheck::Spent
    } else {
        CodeCheck::Mismatch
    }
}

/// Counts for one affirmation round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AffirmationRound {
    pub recipients: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Periodic affirmation mail to opted-in users.
#[derive(Clone)]
pub struct AffirmationSender {
    db: FirestoreDb,
    mailer: Mailer,
    app_url: String,
}

impl AffirmationSender {
    pub fn new(db: FirestoreDb, mailer: Mailer, app_url: &str) -> Self {
        Self {
            db,
            mailer,
            app_url: app_url.to_string(),
        }
    }

    /// Mail one random affirmation to each opted-in user.
    ///
    /// A failed delivery is logged and counted; the round carries on.
    pub async fn send_round(&self) -> Result<AffirmationRound, AppError> {
        let affirmations = self.db.list_affirmations().await?;
        if affirmations.is_empty() {
            tracing::warn!("No affirmations stored; skipping round");
            return Ok(AffirmationRound::default());
        }

        let mut round = AffirmationRound::default();
        for prefs in self.db.list_notification_recipients().await? {
            if prefs.email.trim().is_empty() {
                continue;
            }
            round.recipients += 1;

            let affirmation = &affirmations[random_index(affirmations.len())?];
            let email = affirmation_email(&prefs.email, affirmation, &self.app_url);
            match self.mailer.send(email).await {
                Ok(()) => round.sent += 1,
                Err(e) => {
                    round.failed += 1;
                    tracing::warn!(uid = %prefs.uid, error = %e, "Affirmation email failed");
                }
            }
        }

        tracing::info!(
            recipients = round.recipients,
            sent = round.sent,
            failed = round.failed,
            "Affirmation round finished"
        );
        Ok(round)
    }

    /// Run a round every `period`, the first one `period` from now.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.send_round().await {
                    tracing::error!(error = %e, "Affirmation round failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::format_utc_rfc3339;

    fn stored(
        code: &str,
        expires_in_minutes: i64,
        attempts: u32,
    ) -> (VerificationCode, DateTime<Utc>) {
        let now = Utc::now();
        let code = VerificationCode {
            email: "a@example.com".to_string(),
            code: code.to_string(),
            expires_at: format_utc_rfc3339(now + chrono::Duration::minutes(expires_in_minutes)),
            attempts,
        };
        (code, now)
    }

    #[test]
    fn matching_code_is_valid() {
        let (code, now) = stored("123456", 10, 0);
        assert_eq!(check_code(&code, "123456", now), CodeCheck::Valid);
        assert_eq!(check_code(&code, " 123456 ", now), CodeCheck::Valid);
    }

    #[test]
    fn wrong_code_is_mismatch_until_attempts_run_out() {
        let (code, now) = stored("123456", 10, 0);
        assert_eq!(check_code(&code, "654321", now), CodeCheck::Mismatch);

        let (code, now) = stored("123456", 10, MAX_VERIFICATION_ATTEMPTS - 1);
        assert_eq!(check_code(&code, "654321", now), CodeCheck::Spent);

        let (code, now) = stored("123456", 10, MAX_VERIFICATION_ATTEMPTS);
        assert_eq!(check_code(&code, "123456", now), CodeCheck::Spent);
    }

    #[test]
    fn expired_or_unreadable_code_is_spent() {
        let (code, now) = stored("123456", -1, 0);
        assert_eq!(check_code(&code, "123456", now), CodeCheck::Spent);

        let (mut code, now) = stored("123456", 10, 0);
        code.expires_at = "soon".to_string();
        assert_eq!(check_code(&code, "123456", now), CodeCheck::Spent);
    }

    #[test]
    fn affirmation_email_links_preferences_and_escapes_text() {
        let affirmation = Affirmation {
            text: "You are <enough> & worthy".to_string(),
            category: "Self-Worth".to_string(),
        };

        let email = affirmation_email("a@example.com", &affirmation, "https://lifesync.app/");

        assert_eq!(email.subject, "Weekly Affirmation on Self-Worth");
        assert!(email.text.starts_with("You are <enough> & worthy"));
        assert!(email.html.contains("<p>You are &lt;enough&gt; &amp; worthy</p>"));
        assert!(email
            .html
            .contains("<a href=\"https://lifesync.app/preferences\">Update preferences</a>"));
    }

    #[test]
    fn verification_email_carries_code() {
        let email = verification_email("a@example.com", "482913");
        assert_eq!(email.to, "a@example.com");
        assert!(email.text.contains("482913"));
        assert!(email.html.contains("<strong>482913</strong>"));
    }

    #[tokio::test]
    async fn round_without_database_is_an_error() {
        let (mailer, outbox) = Mailer::capture("noreply@example.com").unwrap();
        let sender = AffirmationSender::new(FirestoreDb::new_mock(), mailer, "http://localhost");

        assert!(matches!(
            sender.send_round().await,
            Err(AppError::Database(_))
        ));
        assert!(outbox.sent().is_empty());
    }
}
