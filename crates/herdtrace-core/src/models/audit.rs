//! Audit log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tamper-evidence record: the SHA-256 of a canonical payload, stored
/// alongside the payload itself.
///
/// `previous_hash` exists for forward compatibility with a chained ledger
/// but is never populated; the log is flat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// SHA-256 hex digest of `payload`
    pub hash: String,
    /// Kind of record hashed (e.g. "treatment")
    pub record_type: String,
    /// ID of the record the payload describes
    pub reference_id: String,
    /// Canonical JSON exactly as hashed
    pub payload: String,
    /// Unused chain link
    pub previous_hash: Option<String>,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}
