//! Database layer for herdtrace.

mod schema;

mod alerts;
mod animals;
mod audit;
mod consultations;
mod drugs;
mod treatments;
mod vets;

pub use schema::*;
pub use treatments::TreatmentFilter;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl DbError {
    /// True when the underlying SQLite error is a constraint violation,
    /// e.g. inserting a duplicate animal tag.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Format a timestamp the way every table stores it.
pub(crate) fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse a stored timestamp back out.
pub(crate) fn parse_ts(raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Constraint(format!("invalid timestamp {raw:?}: {e}")))
}

/// Parse an optional stored timestamp.
pub(crate) fn parse_opt_ts(raw: Option<String>) -> DbResult<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_ts).transpose()
}
