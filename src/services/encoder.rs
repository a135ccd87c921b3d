// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External steganography encoder.
//!
//! The encoder is a separate program invoked as
//! `<cmd> encode-image|encode-video <input> <output> <secret>`; exit status 0
//! means `output` holds the carrier with the secret embedded.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierKind {
    Image,
    Video,
}

impl CarrierKind {
    /// Only image/* and video/* uploads can carry a hidden message.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let major = content_type.split('/').next()?.trim().to_ascii_lowercase();
        match major.as_str() {
            "image" => Some(CarrierKind::Image),
            "video" => Some(CarrierKind::Video),
            _ => None,
        }
    }

    fn subcommand(&self) -> &'static str {
        match self {
            CarrierKind::Image => "encode-image",
            CarrierKind::Video => "encode-video",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("steganography encoder is not configured")]
    NotConfigured,

    #[error("failed to start encoder: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("encoder timed out after {0:?}")]
    Timeout(Duration),

    #[error("encoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

#[derive(Debug, Clone)]
pub struct SteganographyEncoder {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SteganographyEncoder {
    /// Parse a command line such as `python3 tools/steg.py`.
    pub fn new(command: &str, timeout: Duration) -> Result<Self, EncoderError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(EncoderError::NotConfigured)?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }

    pub async fn encode(
        &self,
        kind: CarrierKind,
        input: &Path,
        output: &Path,
        secret: &str,
    ) -> Result<(), EncoderError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(kind.subcommand())
            .arg(input)
            .arg(output)
            .arg(secret)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future on timeout must not leave the process behind.
            .kill_on_drop(true)
            .spawn()
            .map_err(EncoderError::Spawn)?;

        let output_result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| EncoderError::Timeout(self.timeout))?
            .map_err(EncoderError::Spawn)?;

        if !output_result.status.success() {
            let stderr = String::from_utf8_lossy(&output_result.stderr)
                .trim()
                .chars()
                .take(500)
                .collect();
            return Err(EncoderError::Failed {
                status: output_result.status.to_string(),
                stderr,
            });
        }

        tracing::info!(
            kind = kind.subcommand(),
            output = %output.display(),
            "Steganography encoding complete"
        );
        Ok(())
    }
}
