//! Treatment intake and listing.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use herdtrace_core::{
    add_treatment, treatments_for_identity, Frequency, NewTreatment, SafetyFlags, Treatment,
    TreatmentStatus,
};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

use super::{Caller, ListResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTreatmentBody {
    pub animal_id: String,
    pub medicine: String,
    pub dosage: f64,
    pub frequency: Frequency,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub date_given: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vet_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Created-treatment response with the safety verdict flattened in, so
/// clients read the risk score and flags without a second request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentCreated {
    pub success: bool,
    pub treatment: Treatment,
    pub withdrawal_end_date: DateTime<Utc>,
    pub audit_hash: String,
    pub risk_score: u8,
    pub alerts: SafetyFlags,
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    body: Bytes,
) -> Result<(StatusCode, Json<TreatmentCreated>), AppError> {
    let body: AddTreatmentBody =
        serde_json::from_slice(&body).map_err(|_| AppError::validation("Malformed payload"))?;

    let db = state.db()?;
    let outcome = add_treatment(
        &db,
        state.notifier.as_ref(),
        NewTreatment {
            farmer_id: identity.user_id,
            animal_id: body.animal_id,
            vet_id: body.vet_id,
            medicine: body.medicine,
            dosage: body.dosage,
            frequency: body.frequency,
            duration: body.duration,
            date_given: body.date_given,
            notes: body.notes,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(TreatmentCreated {
            success: true,
            treatment: outcome.treatment,
            withdrawal_end_date: outcome.withdrawal_end_date,
            audit_hash: outcome.audit_hash,
            risk_score: outcome.risk_score,
            alerts: outcome.alerts,
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTreatmentsQuery {
    #[serde(default)]
    pub animal_id: Option<String>,
    #[serde(default)]
    pub status: Option<TreatmentStatus>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Query(query): Query<ListTreatmentsQuery>,
) -> Result<Json<ListResponse<Treatment>>, AppError> {
    let db = state.db()?;
    let treatments = treatments_for_identity(&db, &identity, query.animal_id, query.status)?;
    Ok(Json(ListResponse::new(treatments)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use herdtrace_core::{Animal, Identity, Role, Species};

    fn farmer() -> Caller {
        Caller(Identity::new("farmer-1", Role::Farmer))
    }

    fn register_cow(state: &AppState) -> Animal {
        let animal = Animal::new("farmer-1", "COW001", Species::Cow);
        state.db().unwrap().insert_animal(&animal).unwrap();
        animal
    }

    fn body_for(animal_id: &str, medicine: &str, dosage: f64) -> Bytes {
        Bytes::from(
            serde_json::json!({
                "animalId": animal_id,
                "medicine": medicine,
                "dosage": dosage,
                "frequency": "once",
            })
            .to_string(),
        )
    }

    #[tokio::test]
    async fn test_add_returns_created_with_safety_verdict() {
        let state = AppState::for_tests();
        let animal = register_cow(&state);

        let (status, Json(created)) = add(
            State(state.clone()),
            farmer(),
            body_for(&animal.animal_id, "Amoxicillin", 10.0),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(created.success);
        assert_eq!(created.risk_score, 30);
        assert_eq!(created.audit_hash.len(), 64);
        assert!(!created.alerts.overdose);
        assert!(!created.alerts.banned);
    }

    #[tokio::test]
    async fn test_add_unknown_medicine_is_not_found() {
        let state = AppState::for_tests();
        let animal = register_cow(&state);

        let err = add(
            State(state),
            farmer(),
            body_for(&animal.animal_id, "Turmeric", 5.0),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_rejects_malformed_body() {
        let state = AppState::for_tests();

        let err = add(State(state), farmer(), Bytes::from_static(b"{\"animalId\":"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_scopes_to_calling_farmer() {
        let state = AppState::for_tests();
        let animal = register_cow(&state);

        add(
            State(state.clone()),
            farmer(),
            body_for(&animal.animal_id, "Ivermectin", 0.2),
        )
        .await
        .unwrap();

        let Json(mine) = list(
            State(state.clone()),
            farmer(),
            Query(ListTreatmentsQuery {
                animal_id: None,
                status: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(mine.count, 1);

        let Json(other) = list(
            State(state),
            Caller(Identity::new("farmer-2", Role::Farmer)),
            Query(ListTreatmentsQuery {
                animal_id: None,
                status: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(other.count, 0);
    }
}
