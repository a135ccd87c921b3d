// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Solidity ABI encoding for the few shapes the log contract uses:
//! `string`, `string[]` and `uint256` (limited to `u128`).

use sha3::{Digest, Keccak256};

const WORD: usize = 32;

/// ABI decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("return data truncated at offset {0}")]
    Truncated(usize),

    #[error("integer at offset {0} does not fit in the target type")]
    Overflow(usize),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}

/// A value to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    String(String),
    StringArray(Vec<String>),
    Uint(u128),
}

pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// First four bytes of keccak-256 of the canonical signature,
/// e.g. `addLog(string,string)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for a function call: selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    out
}

/// Encode a tuple of tokens with the standard head/tail layout.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = WORD * tokens.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::String(s) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                tail.extend(encode_bytes(s.as_bytes()));
            }
            Token::StringArray(items) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                tail.extend_from_slice(&uint_word(items.len() as u128));
                let elements: Vec<Token> = items.iter().cloned().map(Token::String).collect();
                tail.extend(encode(&elements));
            }
        }
    }

    head.extend(tail);
    head
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&uint_word(bytes.len() as u128));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let end = offset.checked_add(WORD).ok_or(AbiError::Truncated(offset))?;
    data.get(offset..end).ok_or(AbiError::Truncated(offset))
}

fn read_u128(data: &[u8], offset: usize) -> Result<u128, AbiError> {
    let word = read_word(data, offset)?;
    if word[..16].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow(offset));
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(buf))
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let value = read_u128(data, offset)?;
    usize::try_from(value).map_err(|_| AbiError::Overflow(offset))
}

fn decode_string_at(data: &[u8], at: usize) -> Result<String, AbiError> {
    let len = read_usize(data, at)?;
    let start = at + WORD;
    let end = start.checked_add(len).ok_or(AbiError::Overflow(at))?;
    let bytes = data.get(start..end).ok_or(AbiError::Truncated(start))?;
    String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

/// Decode return data consisting of a single `uint256`.
pub fn decode_uint(data: &[u8]) -> Result<u128, AbiError> {
    read_u128(data, 0)
}

/// Decode return data consisting of a single `string[]`.
pub fn decode_string_array(data: &[u8]) -> Result<Vec<String>, AbiError> {
    let array_at = read_usize(data, 0)?;
    let len = read_usize(data, array_at)?;
    let elements_at = array_at + WORD;

    // Every element needs at least its offset word; reject lengths the data can't hold.
    let offsets_end = len
        .checked_mul(WORD)
        .and_then(|n| n.checked_add(elements_at))
        .ok_or(AbiError::Overflow(array_at))?;
    if offsets_end > data.len() {
        return Err(AbiError::Truncated(elements_at));
    }

    (0..len)
        .map(|i| {
            let relative = read_usize(data, elements_at + WORD * i)?;
            let at = elements_at
                .checked_add(relative)
                .ok_or(AbiError::Overflow(elements_at + WORD * i))?;
            decode_string_at(data, at)
        })
        .collect()
}
