// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Random picks and one-time codes from the system CSPRNG.

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

fn random_u64() -> Result<u64, AppError> {
    let mut buf = [0u8; 8];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("random source failed")))?;
    Ok(u64::from_le_bytes(buf))
}

/// Uniform index below `len` (len > 0).
pub fn random_index(len: usize) -> Result<usize, AppError> {
    Ok((random_u64()? % len as u64) as usize)
}

/// Six-digit code in 100000..=999999.
pub fn verification_code() -> Result<String, AppError> {
    Ok((100_000 + random_u64()? % 900_000).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_index_in_range() {
        for len in [1usize, 2, 7, 100] {
            for _ in 0..50 {
                assert!(random_index(len).unwrap() < len);
            }
        }
    }

    #[test]
    fn verification_codes_are_six_digits() {
        for _ in 0..200 {
            let code = verification_code().unwrap();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }
}
