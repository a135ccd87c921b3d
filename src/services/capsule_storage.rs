// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local-disk storage for time-capsule uploads.

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid stored file name: {0}")]
    InvalidName(String),

    #[error("random source failed")]
    Random,

    #[error("file I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(name) => AppError::BadRequest(format!("invalid file name: {name}")),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// A file written to the uploads directory.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
}

/// Uploads directory with name generation and path containment.
#[derive(Clone)]
pub struct CapsuleStorage {
    dir: PathBuf,
    rng: SystemRandom,
}

impl CapsuleStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            rng: SystemRandom::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the uploads directory if missing.
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io {
                path: self.dir.display().to_string(),
                source,
            })
    }

    /// Write an upload as `{millis}-{random}-{sanitized name}`.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        self.ensure_dir().await?;

        let filename = format!(
            "{}-{}-{}",
            unix_millis(),
            self.random_suffix()?,
            sanitize_file_name(original_name)
        );
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Io {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(filename = %filename, size = bytes.len(), "Stored capsule upload");
        Ok(StoredFile { filename, path })
    }

    /// Resolve a stored name inside the uploads directory.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let valid = !filename.is_empty()
            && !filename.starts_with('.')
            && !filename.contains(['/', '\\'])
            && !filename.contains("..");
        if !valid {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }

    /// Read a stored file; `Ok(None)` if it no longer exists.
    pub async fn read(&self, filename: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Best-effort removal used on cleanup paths.
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %path.display(), "Failed to remove upload");
            }
        }
    }

    fn random_suffix(&self) -> Result<u32, StorageError> {
        let mut buf = [0u8; 4];
        self.rng.fill(&mut buf).map_err(|_| StorageError::Random)?;
        Ok(u32::from_be_bytes(buf) % 1_000_000_000)
    }
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    // Browsers may send a full client path.
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "upload".to_string();
    }

    // Keep the extension when truncating.
    if cleaned.len() > MAX_NAME_LEN {
        let ext = cleaned
            .rfind('.')
            .map(|i| &cleaned[i..])
            .filter(|ext| ext.len() <= 10)
            .unwrap_or("");
        let stem = &cleaned[..MAX_NAME_LEN - ext.len()];
        return format!("{stem}{ext}");
    }

    cleaned.to_string()
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
