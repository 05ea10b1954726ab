//! Consultation workflow: nearby-vet search, request broadcast, and the
//! acceptance state machine.

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use crate::db::{Database, DbError};
use crate::geo;
use crate::models::{
    Consultation, ConsultationStatus, GeoPoint, Identity, NearbyVet, Role,
    DEFAULT_CONSULTATION_RADIUS_METERS,
};
use crate::notify::{
    ConsultationAccepted, ConsultationClosed, ConsultationRequest, ConsultationUpdate, Event,
    Notifier,
};

/// Message delivered to vets who lost the acceptance race.
const CONSULTATION_TAKEN: &str =
    "This consultation has already been accepted by another veterinarian";

#[derive(Debug, Error)]
pub enum ConsultError {
    #[error("{0}")]
    Validation(String),
    #[error("Consultation not found")]
    NotFound,
    #[error("No veterinarians found within the specified radius")]
    NoVetsNearby,
    #[error("Only veterinarians can accept consultations")]
    VetRoleRequired,
    #[error("Consultation is already {}", .0.as_str())]
    AlreadyResolved(ConsultationStatus),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Input for opening a consultation.
#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub farmer_id: String,
    pub symptom: String,
    pub mobile_number: String,
    pub location: GeoPoint,
    pub animal_id: Option<String>,
    pub radius_meters: Option<f64>,
    /// Restrict the broadcast to this subset of the nearby candidates.
    pub selected_vet_ids: Option<Vec<String>>,
}

/// A freshly created consultation and how many vets were notified.
#[derive(Debug, Clone)]
pub struct ConsultationCreated {
    pub consultation: Consultation,
    pub notified_vets: usize,
}

/// Available vets within `radius_meters` of a point, nearest first.
///
/// The indexed bounding-box query is the primary path; if it fails, the
/// search falls back to scanning every stored location. Either way each
/// candidate is refined with an exact haversine distance, and candidates
/// with unusable coordinates are silently excluded.
pub fn find_nearby_vets(
    db: &Database,
    lat: f64,
    lng: f64,
    radius_meters: f64,
) -> Result<Vec<NearbyVet>, ConsultError> {
    if !geo::valid_coordinates(lat, lng) {
        return Err(ConsultError::Validation(
            "Invalid coordinates provided".to_string(),
        ));
    }

    let bbox = geo::bounding_box(lat, lng, radius_meters);
    let locations = match db.vet_locations_in_box(&bbox) {
        Ok(locations) => locations,
        Err(err) => {
            warn!(error = %err, "indexed vet location query failed, scanning all locations");
            db.all_available_vet_locations()?
        }
    };

    let mut nearby: Vec<NearbyVet> = locations
        .into_iter()
        .filter(|location| location.has_valid_point())
        .filter_map(|location| {
            let distance = geo::haversine_meters(lat, lng, location.lat, location.lng);
            (distance <= radius_meters).then(|| NearbyVet {
                vet_id: location.vet_id,
                lat: location.lat,
                lng: location.lng,
                is_available: location.is_available,
                is_online: location.is_online,
                distance_meters: round2(distance),
                distance_km: round2(distance / 1000.0),
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
    Ok(nearby)
}

/// Open a consultation: validate the request, find candidates, persist the
/// pending record, and broadcast a request event to each candidate.
pub fn create_consultation(
    db: &Database,
    notifier: &dyn Notifier,
    input: NewConsultation,
) -> Result<ConsultationCreated, ConsultError> {
    if input.symptom.trim().is_empty() {
        return Err(ConsultError::Validation(
            "Symptom, mobile number, and location (lat, lng) are required".to_string(),
        ));
    }
    if !crate::models::is_valid_mobile(&input.mobile_number) {
        return Err(ConsultError::Validation(
            "Please provide a valid 10-digit mobile number".to_string(),
        ));
    }

    let radius = input
        .radius_meters
        .unwrap_or(DEFAULT_CONSULTATION_RADIUS_METERS);
    let nearby = find_nearby_vets(db, input.location.lat, input.location.lng, radius)?;
    if nearby.is_empty() {
        return Err(ConsultError::NoVetsNearby);
    }

    let candidates = match &input.selected_vet_ids {
        Some(selected) if !selected.is_empty() => {
            let subset: Vec<NearbyVet> = nearby
                .into_iter()
                .filter(|vet| selected.contains(&vet.vet_id))
                .collect();
            if subset.is_empty() {
                return Err(ConsultError::Validation(
                    "Selected veterinarians not found in nearby list".to_string(),
                ));
            }
            subset
        }
        _ => nearby,
    };

    let mut consultation = Consultation::new(
        &input.farmer_id,
        &input.symptom,
        &input.mobile_number,
        input.location,
    );
    consultation.animal_id = input.animal_id;
    consultation.radius_meters = radius;
    consultation.notified_vet_ids = candidates.iter().map(|vet| vet.vet_id.clone()).collect();
    db.insert_consultation(&consultation)?;

    for vet in &candidates {
        notifier.notify_user(
            &vet.vet_id,
            &Event::ConsultationRequest(ConsultationRequest {
                consultation_id: consultation.consultation_id.clone(),
                farmer_id: consultation.farmer_id.clone(),
                mobile_number: consultation.mobile_number.clone(),
                symptom: consultation.symptom.clone(),
                location: consultation.location,
                animal_id: consultation.animal_id.clone(),
                created_at: consultation.created_at,
                distance_meters: vet.distance_meters,
                distance_km: vet.distance_km,
            }),
        );
    }

    Ok(ConsultationCreated {
        notified_vets: candidates.len(),
        consultation,
    })
}

/// Accept a pending consultation as the given vet.
///
/// The claim is a conditional update on `status = 'pending'`, so at most one
/// vet wins; losers get the consultation's current status back. On success
/// the farmer is notified and every other originally-notified vet gets a
/// closed event so their UI retracts the request.
pub fn accept_consultation(
    db: &Database,
    notifier: &dyn Notifier,
    consultation_id: &str,
    vet: &Identity,
) -> Result<Consultation, ConsultError> {
    if vet.role != Role::Vet {
        return Err(ConsultError::VetRoleRequired);
    }

    let consultation = db
        .get_consultation(consultation_id)?
        .ok_or(ConsultError::NotFound)?;
    if consultation.status != ConsultationStatus::Pending {
        return Err(ConsultError::AlreadyResolved(consultation.status));
    }

    let accepted_at = Utc::now();
    if !db.try_accept_consultation(consultation_id, &vet.user_id, accepted_at)? {
        // Lost the race: report whatever state the winner left behind.
        let current = db
            .get_consultation(consultation_id)?
            .ok_or(ConsultError::NotFound)?;
        return Err(ConsultError::AlreadyResolved(current.status));
    }

    let accepted = db
        .get_consultation(consultation_id)?
        .ok_or(ConsultError::NotFound)?;

    notifier.notify_user(
        &accepted.farmer_id,
        &Event::ConsultationAccepted(ConsultationAccepted {
            consultation_id: accepted.consultation_id.clone(),
            vet_id: vet.user_id.clone(),
            accepted_at,
        }),
    );

    for other in accepted
        .notified_vet_ids
        .iter()
        .filter(|id| *id != &vet.user_id)
    {
        notifier.notify_user(
            other,
            &Event::ConsultationClosed(ConsultationClosed {
                consultation_id: accepted.consultation_id.clone(),
                message: CONSULTATION_TAKEN.to_string(),
                accepted_by: vet.user_id.clone(),
            }),
        );
    }

    Ok(accepted)
}

/// Set a consultation's status directly and notify both parties.
pub fn update_consultation_status(
    db: &Database,
    notifier: &dyn Notifier,
    consultation_id: &str,
    status: ConsultationStatus,
) -> Result<Consultation, ConsultError> {
    if !db.set_consultation_status(consultation_id, status)? {
        return Err(ConsultError::NotFound);
    }
    let consultation = db
        .get_consultation(consultation_id)?
        .ok_or(ConsultError::NotFound)?;

    let update = Event::ConsultationUpdate(ConsultationUpdate {
        consultation_id: consultation.consultation_id.clone(),
        status: consultation.status,
        updated_at: Utc::now(),
    });
    notifier.notify_user(&consultation.farmer_id, &update);
    if let Some(vet_id) = &consultation.vet_id {
        notifier.notify_user(vet_id, &update);
    }

    Ok(consultation)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
