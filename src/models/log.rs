//! Tamper-evident log entries stored on chain.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Block timestamp as the contract wrote it.
///
/// Solidity's string builders often quote numbers; both forms are kept
/// as-is so a record reads back exactly as it was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogTimestamp {
    Number(u64),
    Text(String),
}

impl LogTimestamp {
    /// Unix seconds, or `None` when the text isn't a number.
    pub fn as_secs(&self) -> Option<u64> {
        match self {
            LogTimestamp::Number(n) => Some(*n),
            LogTimestamp::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One log line, as JSON-encoded by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default)]
    pub user_id: String,
    pub message: String,
    pub timestamp: LogTimestamp,
    /// Any other fields the contract recorded
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parse raw contract strings, dropping malformed ones, newest first.
pub fn parse_log_entries(raw: &[String]) -> Vec<LogEntry> {
    let mut entries: Vec<(u64, LogEntry)> = raw
        .iter()
        .filter_map(|line| match serde_json::from_str::<LogEntry>(line) {
            Ok(entry) => match entry.timestamp.as_secs() {
                Some(secs) => Some((secs, entry)),
                None => {
                    tracing::warn!(raw = %line, "Skipping log with non-numeric timestamp");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, raw = %line, "Skipping invalid log JSON");
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries.into_iter().map(|(_, entry)| entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_entries_dropped_and_sorted_newest_first() {
        let raw = vec![
            r#"{"userId":"u1","message":"User Logged In","timestamp":100}"#.to_string(),
            "not json".to_string(),
            r#"{"userId":"u1","message":"Visited /dashboard","timestamp":"300"}"#.to_string(),
            r#"{"userId":"u1","timestamp":200}"#.to_string(),
            r#"{"userId":"u1","message":"Bad clock","timestamp":"yesterday"}"#.to_string(),
            r#"{"userId":"u1","message":"User Logged Out","timestamp":200}"#.to_string(),
        ];

        let entries = parse_log_entries(&raw);
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Visited /dashboard", "User Logged Out", "User Logged In"]
        );
        assert_eq!(entries[0].timestamp.as_secs(), Some(300));
    }

    #[test]
    fn stored_fields_read_back_unchanged() {
        let raw = vec![
            r#"{"userId":"u1","message":"Visited /journal","timestamp":"300","page":"/journal","durationMs":1200}"#
                .to_string(),
        ];

        let entries = parse_log_entries(&raw);
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(
            json,
            json!({
                "userId": "u1",
                "message": "Visited /journal",
                "timestamp": "300",
                "page": "/journal",
                "durationMs": 1200
            })
        );
    }

    #[test]
    fn serializes_camel_case() {
        let entry = LogEntry {
            user_id: "abc".to_string(),
            message: "hello".to_string(),
            timestamp: LogTimestamp::Number(7),
            extra: Map::new(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["userId"], "abc");
        assert_eq!(json["timestamp"], 7);
    }
}
