//! Animal registry.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use herdtrace_core::{AgeUnit, Animal, FarmType, Role, Species};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

use super::{Caller, DataResponse, MessageResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAnimalBody {
    pub tag_id: String,
    pub species: Species,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub farm_type: Option<FarmType>,
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub age_unit: Option<AgeUnit>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse<Animal>>), AppError> {
    if identity.role != Role::Farmer {
        return Err(AppError::forbidden("Only farmers can register animals"));
    }
    let body: RegisterAnimalBody =
        serde_json::from_slice(&body).map_err(|_| AppError::validation("Malformed payload"))?;

    let mut animal = Animal::new(&identity.user_id, &body.tag_id, body.species);
    animal.name = body.name;
    animal.farm_type = body.farm_type;
    animal.age = body.age;
    if let Some(age_unit) = body.age_unit {
        animal.age_unit = age_unit;
    }

    let db = state.db()?;
    db.insert_animal(&animal).map_err(|err| {
        if err.is_constraint_violation() {
            AppError::Conflict("Duplicate field value entered".to_string())
        } else {
            AppError::from(err)
        }
    })?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Animal registered successfully",
            animal,
        )),
    ))
}

pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Animal>>, AppError> {
    let db = state.db()?;
    let animal = db
        .get_animal(&id)?
        .ok_or_else(|| AppError::not_found("Animal not found"))?;
    Ok(Json(DataResponse::new(animal)))
}
