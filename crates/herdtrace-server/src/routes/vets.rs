//! Veterinarian location reporting.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use herdtrace_core::{geo, Role, VetLocation};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

use super::{Caller, MessageResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationBody {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub is_available: Option<bool>,
}

pub async fn update_location(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    body: Bytes,
) -> Result<Json<MessageResponse<VetLocation>>, AppError> {
    if identity.role != Role::Vet {
        return Err(AppError::forbidden(
            "Only veterinarians can update location",
        ));
    }
    let body: UpdateLocationBody =
        serde_json::from_slice(&body).map_err(|_| AppError::validation("Malformed payload"))?;
    if !geo::valid_coordinates(body.lat, body.lng) {
        return Err(AppError::validation("Invalid coordinates provided"));
    }

    let mut location = VetLocation::new(&identity.user_id, body.lat, body.lng);
    if let Some(is_available) = body.is_available {
        location.is_available = is_available;
    }

    let db = state.db()?;
    db.upsert_vet_location(&location)?;
    // Re-read so the response carries the stored online flag, which the
    // upsert leaves alone.
    let stored = db
        .get_vet_location(&identity.user_id)?
        .ok_or_else(|| AppError::not_found("Vet location not found"))?;
    Ok(Json(MessageResponse::new(
        "Location updated successfully",
        stored,
    )))
}
