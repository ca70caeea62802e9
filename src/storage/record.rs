//! On-disk record envelope.
//!
//! ```text
//! { "format": 1, "checksum": "<sha256 hex of body>", "body": "<report json>" }
//! ```
//!
//! The checksum covers the exact body string, so a torn or hand-edited
//! file is detected instead of being half-trusted.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::report::Report;

/// Current envelope format.
pub const RECORD_FORMAT: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub format: u32,
    pub checksum: String,
    pub body: String,
}

/// Serialize a report into envelope bytes.
pub fn encode_record(report: &Report) -> Result<Vec<u8>, StoreError> {
    let body = serde_json::to_string(report).map_err(|source| StoreError::Serialize {
        id: report.id(),
        source,
    })?;
    let record = ReportRecord {
        format: RECORD_FORMAT,
        checksum: compute_checksum(&body),
        body,
    };
    serde_json::to_vec(&record).map_err(|source| StoreError::Serialize {
        id: report.id(),
        source,
    })
}

/// Parse and verify envelope bytes. `name` identifies the record in errors.
pub fn decode_record(name: &str, bytes: &[u8]) -> Result<Report, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        id: name.to_string(),
        reason,
    };

    let record: ReportRecord = serde_json::from_slice(bytes)
        .map_err(|e| corrupt(format!("envelope unreadable: {}", e)))?;

    if record.format != RECORD_FORMAT {
        return Err(corrupt(format!("unsupported format {}", record.format)));
    }

    let actual = compute_checksum(&record.body);
    if actual != record.checksum {
        return Err(corrupt(format!(
            "checksum mismatch expected={} actual={}",
            record.checksum, actual
        )));
    }

    serde_json::from_str(&record.body).map_err(|e| corrupt(format!("body unreadable: {}", e)))
}

/// SHA-256 of a record body, hex encoded.
pub fn compute_checksum(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}
