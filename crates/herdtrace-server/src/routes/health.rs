//! Liveness probe.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn check() -> Json<Health> {
    Json(Health {
        success: true,
        message: "HerdTrace API is running",
        timestamp: Utc::now(),
    })
}
