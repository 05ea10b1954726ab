//! Consultation lifecycle: vet discovery, broadcast, acceptance, status.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use herdtrace_core::{
    accept_consultation, create_consultation, find_nearby_vets,
    models::DEFAULT_CONSULTATION_RADIUS_METERS, update_consultation_status, Consultation,
    ConsultationStatus, GeoPoint, NearbyVet, NewConsultation,
};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

use super::{Caller, DataResponse, ListResponse, MessageResponse};

/// Coordinates arrive as raw query strings so a malformed value can be
/// reported distinctly from a missing one.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lng: Option<String>,
    #[serde(default)]
    pub radius: Option<String>,
}

fn parse_finite(raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| AppError::validation("Invalid latitude, longitude, or radius values"))
}

pub async fn nearby(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ListResponse<NearbyVet>>, AppError> {
    let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
        return Err(AppError::validation("Latitude and longitude are required"));
    };
    let lat = parse_finite(&lat)?;
    let lng = parse_finite(&lng)?;
    let radius = match query.radius {
        Some(raw) => parse_finite(&raw)?,
        None => DEFAULT_CONSULTATION_RADIUS_METERS,
    };

    let db = state.db()?;
    let vets = find_nearby_vets(&db, lat, lng, radius)?;
    Ok(Json(ListResponse::new(vets)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsultationBody {
    #[serde(default)]
    pub symptom: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub animal_id: Option<String>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub selected_vet_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationCreatedBody {
    pub success: bool,
    pub message: &'static str,
    pub data: Consultation,
    pub nearby_vets_count: usize,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    body: Bytes,
) -> Result<(StatusCode, Json<ConsultationCreatedBody>), AppError> {
    let body: CreateConsultationBody =
        serde_json::from_slice(&body).map_err(|_| AppError::validation("Malformed payload"))?;

    let (Some(symptom), Some(mobile_number), Some(location)) =
        (body.symptom, body.mobile_number, body.location)
    else {
        return Err(AppError::validation(
            "Symptom, mobile number, and location (lat, lng) are required",
        ));
    };

    let db = state.db()?;
    let created = create_consultation(
        &db,
        state.notifier.as_ref(),
        NewConsultation {
            farmer_id: identity.user_id,
            symptom,
            mobile_number,
            location,
            animal_id: body.animal_id,
            radius_meters: body.radius,
            selected_vet_ids: body.selected_vet_ids,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ConsultationCreatedBody {
            success: true,
            message: "Consultation request created successfully",
            data: created.consultation,
            nearby_vets_count: created.notified_vets,
        }),
    ))
}

pub async fn accept(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse<Consultation>>, AppError> {
    let db = state.db()?;
    let consultation = accept_consultation(&db, state.notifier.as_ref(), &id, &identity)?;
    Ok(Json(MessageResponse::new(
        "Consultation accepted successfully",
        consultation,
    )))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<DataResponse<Consultation>>, AppError> {
    let body: UpdateStatusBody =
        serde_json::from_slice(&body).map_err(|_| AppError::validation("Malformed payload"))?;
    let status = body
        .status
        .as_deref()
        .and_then(ConsultationStatus::parse)
        .ok_or_else(|| AppError::validation("Invalid status"))?;

    let db = state.db()?;
    let consultation = update_consultation_status(&db, state.notifier.as_ref(), &id, status)?;
    Ok(Json(DataResponse::new(consultation)))
}

pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Consultation>>, AppError> {
    let db = state.db()?;
    let consultation = db
        .get_consultation(&id)?
        .ok_or_else(|| AppError::not_found("Consultation not found"))?;
    Ok(Json(DataResponse::new(consultation)))
}

pub async fn farmer_list(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<Json<ListResponse<Consultation>>, AppError> {
    let db = state.db()?;
    let consultations = db.list_consultations_for_farmer(&identity.user_id)?;
    Ok(Json(ListResponse::new(consultations)))
}

pub async fn vet_list(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<Json<ListResponse<Consultation>>, AppError> {
    let db = state.db()?;
    let consultations = db.list_consultations_for_vet(&identity.user_id)?;
    Ok(Json(ListResponse::new(consultations)))
}
