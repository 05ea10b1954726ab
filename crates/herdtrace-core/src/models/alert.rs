//! Alert models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Safe,
    Warning,
    Violation,
}

/// How urgently the alert needs attention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A persisted alert raised for a farmer.
///
/// Alerts are append-only; the only mutation is marking one read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Unique alert ID
    pub alert_id: String,
    /// Farmer the alert is addressed to
    pub farmer_id: String,
    /// Related animal, if any
    pub animal_id: Option<String>,
    /// Related treatment, if any
    pub treatment_id: Option<String>,
    /// Kind of alert
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Short headline
    pub title: String,
    /// Full message
    pub message: String,
    /// Urgency
    pub severity: AlertSeverity,
    /// Whether the farmer has seen it
    pub read_status: bool,
    /// When it was marked read
    pub read_at: Option<DateTime<Utc>>,
    /// Whether the farmer must act on it
    pub action_required: bool,
    /// Free-form context for the client
    pub metadata: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Create an unread alert with required fields.
    pub fn new(
        farmer_id: &str,
        alert_type: AlertType,
        title: &str,
        message: &str,
        severity: AlertSeverity,
    ) -> Self {
        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            farmer_id: farmer_id.to_string(),
            animal_id: None,
            treatment_id: None,
            alert_type,
            title: title.to_string(),
            message: message.to_string(),
            severity,
            read_status: false,
            read_at: None,
            action_required: false,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }
}
