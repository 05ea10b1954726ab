//! Real-time notification events and the sink they are delivered through.
//!
//! Events are serialized with an `event` tag so a single channel can carry
//! every kind. Delivery is fire-and-forget: implementations log failures
//! and never surface them to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Alert, AlertSeverity, AlertType, ConsultationStatus, GeoPoint};

/// A consultation request offered to one nearby vet. Distance fields are
/// relative to the receiving vet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequest {
    pub consultation_id: String,
    pub farmer_id: String,
    pub mobile_number: String,
    pub symptom: String,
    pub location: GeoPoint,
    pub animal_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub distance_meters: f64,
    pub distance_km: f64,
}

/// Sent to the farmer when a vet takes their consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationAccepted {
    pub consultation_id: String,
    pub vet_id: String,
    pub accepted_at: DateTime<Utc>,
}

/// Sent to the vets who lost the race so their UI retracts the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationClosed {
    pub consultation_id: String,
    pub message: String,
    pub accepted_by: String,
}

/// Sent to both parties on a direct status change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationUpdate {
    pub consultation_id: String,
    pub status: ConsultationStatus,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight alert notification pushed alongside a persisted alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertPing {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
}

impl From<&Alert> for AlertPing {
    fn from(alert: &Alert) -> Self {
        Self {
            alert_type: alert.alert_type,
            title: alert.title.clone(),
            message: alert.message.clone(),
            severity: alert.severity,
        }
    }
}

/// Broadcast to vets when a farmer records a treatment without one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentReview {
    pub treatment_id: String,
    pub farmer_id: String,
    pub animal_id: String,
    pub medicine: String,
    pub message: String,
}

/// Every event the system pushes over real-time channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    ConsultationRequest(ConsultationRequest),
    ConsultationAccepted(ConsultationAccepted),
    ConsultationClosed(ConsultationClosed),
    ConsultationUpdate(ConsultationUpdate),
    NewAlert(AlertPing),
    TreatmentReview(TreatmentReview),
}

/// Sink for real-time events.
///
/// Implementations must not block and must not fail the caller: a
/// notification that cannot be delivered is logged and dropped.
pub trait Notifier: Send + Sync {
    /// Deliver an event to one user's private channel.
    fn notify_user(&self, user_id: &str, event: &Event);

    /// Deliver an event to every connected veterinarian.
    fn broadcast_vets(&self, event: &Event);
}

/// Notifier that drops everything. Useful in tests and offline tooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify_user(&self, _user_id: &str, _event: &Event) {}

    fn broadcast_vets(&self, _event: &Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_tag_is_kebab_case() {
        let event = Event::ConsultationAccepted(ConsultationAccepted {
            consultation_id: "c-1".into(),
            vet_id: "vet-1".into(),
            accepted_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        });

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "consultation-accepted");
        assert_eq!(json["consultationId"], "c-1");
        assert_eq!(json["vetId"], "vet-1");
    }

    #[test]
    fn test_request_event_shape() {
        let event = Event::ConsultationRequest(ConsultationRequest {
            consultation_id: "c-1".into(),
            farmer_id: "farmer-1".into(),
            mobile_number: "9876543210".into(),
            symptom: "limping".into(),
            location: GeoPoint { lat: 28.61, lng: 77.2 },
            animal_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            distance_meters: 4821.55,
            distance_km: 4.82,
        });

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "consultation-request");
        assert_eq!(json["distanceMeters"], 4821.55);
        assert_eq!(json["distanceKm"], 4.82);
        assert_eq!(json["location"]["lat"], 28.61);
    }

    #[test]
    fn test_alert_ping_uses_type_key() {
        let alert = Alert::new(
            "farmer-1",
            AlertType::Violation,
            "Overdose Detected",
            "High dosage detected",
            AlertSeverity::Critical,
        );
        let event = Event::NewAlert(AlertPing::from(&alert));

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "new-alert");
        assert_eq!(json["type"], "violation");
        assert_eq!(json["severity"], "critical");
    }

    #[test]
    fn test_event_round_trip() {
        let event = Event::ConsultationClosed(ConsultationClosed {
            consultation_id: "c-1".into(),
            message: "This consultation has already been accepted by another veterinarian"
                .into(),
            accepted_by: "vet-2".into(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
