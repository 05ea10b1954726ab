//! Audit log database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_ts, ts, Database, DbError, DbResult};
use crate::models::AuditRecord;

impl Database {
    /// Append an audit record. The log is insert-only.
    pub fn insert_audit_record(&self, record: &AuditRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO audit_log (
                hash, record_type, reference_id, payload, previous_hash, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.hash,
                record.record_type,
                record.reference_id,
                record.payload,
                record.previous_hash,
                ts(&record.created_at),
            ],
        )?;
        Ok(())
    }

    /// Fetch an audit record by its hash.
    pub fn get_audit_record(&self, hash: &str) -> DbResult<Option<AuditRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT hash, record_type, reference_id, payload, previous_hash, created_at
                 FROM audit_log WHERE hash = ?1",
                [hash],
                AuditRow::from_row,
            )
            .optional()?;
        row.map(AuditRecord::try_from).transpose()
    }
}

struct AuditRow {
    hash: String,
    record_type: String,
    reference_id: String,
    payload: String,
    previous_hash: Option<String>,
    created_at: String,
}

impl AuditRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            hash: row.get(0)?,
            record_type: row.get(1)?,
            reference_id: row.get(2)?,
            payload: row.get(3)?,
            previous_hash: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl TryFrom<AuditRow> for AuditRecord {
    type Error = DbError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(AuditRecord {
            hash: row.hash,
            record_type: row.record_type,
            reference_id: row.reference_id,
            payload: row.payload,
            previous_hash: row.previous_hash,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}
