//! Consultation request models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default broadcast radius for consultation requests, in meters.
pub const DEFAULT_CONSULTATION_RADIUS_METERS: f64 = 25_000.0;

/// Lifecycle state of a consultation request.
///
/// `pending -> active -> closed`, or `pending -> rejected`. The
/// pending-to-active transition is taken exactly once, by the accepting vet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Pending,
    Active,
    Closed,
    Rejected,
}

impl ConsultationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "pending",
            ConsultationStatus::Active => "active",
            ConsultationStatus::Closed => "closed",
            ConsultationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ConsultationStatus::Pending),
            "active" => Some(ConsultationStatus::Active),
            "closed" => Some(ConsultationStatus::Closed),
            "rejected" => Some(ConsultationStatus::Rejected),
            _ => None,
        }
    }
}

/// A geographic point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A farmer's request for veterinary help, broadcast to nearby vets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    /// Unique consultation ID
    pub consultation_id: String,
    /// Requesting farmer
    pub farmer_id: String,
    /// Accepting vet, set exactly once
    pub vet_id: Option<String>,
    /// Affected animal, if named
    pub animal_id: Option<String>,
    /// Symptom description
    pub symptom: String,
    /// Farmer's callback number
    pub mobile_number: String,
    /// Where help is needed
    pub location: GeoPoint,
    /// Lifecycle status
    pub status: ConsultationStatus,
    /// Broadcast radius in meters
    pub radius_meters: f64,
    /// Vets the request was originally broadcast to
    pub notified_vet_ids: Vec<String>,
    /// When a vet accepted
    pub accepted_at: Option<DateTime<Utc>>,
    /// When the consultation was closed
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Consultation {
    /// Create a pending consultation with required fields.
    pub fn new(farmer_id: &str, symptom: &str, mobile_number: &str, location: GeoPoint) -> Self {
        Self {
            consultation_id: uuid::Uuid::new_v4().to_string(),
            farmer_id: farmer_id.to_string(),
            vet_id: None,
            animal_id: None,
            symptom: symptom.to_string(),
            mobile_number: mobile_number.to_string(),
            location,
            status: ConsultationStatus::Pending,
            radius_meters: DEFAULT_CONSULTATION_RADIUS_METERS,
            notified_vet_ids: Vec::new(),
            accepted_at: None,
            closed_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Validate a 10-digit Indian mobile number (first digit 6-9).
pub fn is_valid_mobile(number: &str) -> bool {
    let bytes = number.as_bytes();
    bytes.len() == 10
        && (b'6'..=b'9').contains(&bytes[0])
        && bytes.iter().all(|b| b.is_ascii_digit())
}
