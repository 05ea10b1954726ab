//! Shared request state.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context};
use herdtrace_core::{seed_drugs, Database};

use crate::{config::Config, error::AppError, ws::BroadcastNotifier};

/// State shared across handlers and background tasks.
pub struct AppState {
    db: Mutex<Database>,
    pub notifier: Arc<BroadcastNotifier>,
    pub config: Config,
}

impl AppState {
    /// Open the database, seed the drug reference, and assemble the state.
    pub fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let db = Database::open(&config.db_path)
            .with_context(|| format!("opening database at {}", config.db_path))?;
        seed_drugs(&db).context("seeding drug reference")?;

        Ok(Arc::new(Self {
            db: Mutex::new(db),
            notifier: Arc::new(BroadcastNotifier::new(256)),
            config,
        }))
    }

    /// Lock the database for one synchronous unit of work. The guard must
    /// not be held across an await point.
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("database lock poisoned")))
    }
}

#[cfg(test)]
impl AppState {
    /// State over a throwaway in-memory database.
    pub fn for_tests() -> Arc<Self> {
        let db = Database::open_in_memory().unwrap();
        seed_drugs(&db).unwrap();
        Arc::new(Self {
            db: Mutex::new(db),
            notifier: Arc::new(BroadcastNotifier::new(16)),
            config: Config {
                addr: "127.0.0.1:0".to_string(),
                db_path: ":memory:".to_string(),
                sweep_secs: 3600,
                cors_origin: None,
            },
        })
    }
}
