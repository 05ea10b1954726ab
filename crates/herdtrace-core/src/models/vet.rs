//! Veterinarian location models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vet's last reported position, used by the nearby search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VetLocation {
    /// Vet's user ID
    pub vet_id: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// Whether the vet is taking consultations
    pub is_available: bool,
    /// Whether the vet currently has a live socket
    pub is_online: bool,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VetLocation {
    pub fn new(vet_id: &str, lat: f64, lng: f64) -> Self {
        Self {
            vet_id: vet_id.to_string(),
            lat,
            lng,
            is_available: true,
            is_online: false,
            updated_at: Utc::now(),
        }
    }

    /// Whether the stored point is a syntactically valid coordinate pair.
    pub fn has_valid_point(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A candidate vet returned by the nearby search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NearbyVet {
    /// Vet's user ID
    pub vet_id: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// Whether the vet is taking consultations
    pub is_available: bool,
    /// Whether the vet currently has a live socket
    pub is_online: bool,
    /// Distance from the query point in meters, rounded to 2 decimals
    pub distance_meters: f64,
    /// Same distance in kilometers, rounded to 2 decimals
    pub distance_km: f64,
}
