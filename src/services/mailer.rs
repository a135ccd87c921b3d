// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing email over SMTP.
//!
//! Messages go out as multipart/alternative with a plain-text and an HTML
//! body. The capture transport keeps messages in memory instead, for local
//! development and tests.

use crate::config::SmtpConfig;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::{Arc, Mutex};

/// Port for SMTP over implicit TLS; anything else negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

impl From<MailError> for crate::error::AppError {
    fn from(err: MailError) -> Self {
        crate::error::AppError::Mail(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Messages accepted by a capture transport, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<OutgoingEmail>>>);

impl Outbox {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, email: OutgoingEmail) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(email);
    }
}

#[derive(Clone)]
enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Capture(Outbox),
}

#[derive(Clone)]
pub struct Mailer {
    from: Mailbox,
    transport: Transport,
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

impl Mailer {
    pub fn smtp(config: &SmtpConfig) -> Result<Self, MailError> {
        let builder = if config.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        };
        let builder = builder.map_err(|e| MailError::Transport(e.to_string()))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer configured");

        Ok(Self {
            from: parse_mailbox(&config.from)?,
            transport: Transport::Smtp(transport),
        })
    }

    /// A mailer that records messages instead of sending them.
    pub fn capture(from: &str) -> Result<(Self, Outbox), MailError> {
        let outbox = Outbox::default();
        let mailer = Self {
            from: parse_mailbox(from)?,
            transport: Transport::Capture(outbox.clone()),
        };
        Ok((mailer, outbox))
    }

    pub async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        // Built for both transports so bad addresses fail the same way.
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))?;

        match &self.transport {
            Transport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| MailError::Transport(e.to_string()))?;
            }
            Transport::Capture(outbox) => outbox.push(email),
        }
        Ok(())
    }
}

/// Escape text for interpolation into an HTML body.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: "Hello".to_string(),
            text: "Hi there".to_string(),
            html: "<p>Hi there</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn capture_records_messages_in_order() {
        let (mailer, outbox) = Mailer::capture("LifeSync <noreply@example.com>").unwrap();

        mailer.send(email("a@example.com")).await.unwrap();
        mailer.send(email("b@example.com")).await.unwrap();

        let sent = outbox.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@example.com");
        assert_eq!(sent[1].to, "b@example.com");
    }

    #[tokio::test]
    async fn bad_recipient_is_rejected_before_sending() {
        let (mailer, outbox) = Mailer::capture("noreply@example.com").unwrap();

        let err = mailer.send(email("not an address")).await.unwrap_err();

        assert!(matches!(err, MailError::Address { .. }));
        assert!(outbox.sent().is_empty());
    }

    #[test]
    fn bad_sender_is_rejected() {
        assert!(Mailer::capture("LifeSync <nobody>").is_err());
    }

    #[test]
    fn html_escaping() {
        assert_eq!(
            escape_html(r#"<b>"You" & 'me'</b>"#),
            "&lt;b&gt;&quot;You&quot; &amp; &#39;me&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
