//! Alert inbox.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use herdtrace_core::Alert;
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

use super::{Caller, ListResponse, MessageResponse};

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub unread: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<ListResponse<Alert>>, AppError> {
    let unread_only = matches!(query.unread.as_deref(), Some("true"));
    let db = state.db()?;
    let alerts = db.list_alerts(&identity.user_id, unread_only)?;
    Ok(Json(ListResponse::new(alerts)))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse<Alert>>, AppError> {
    let db = state.db()?;
    let alert = db
        .get_alert(&id)?
        .ok_or_else(|| AppError::not_found("Alert not found"))?;
    if alert.farmer_id != identity.user_id {
        return Err(AppError::forbidden("Not authorized to modify this alert"));
    }

    db.mark_alert_read(&id)?;
    let updated = db
        .get_alert(&id)?
        .ok_or_else(|| AppError::not_found("Alert not found"))?;
    Ok(Json(MessageResponse::new("Alert marked as read", updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use herdtrace_core::{AlertSeverity, AlertType, Identity, Role};

    fn farmer() -> Caller {
        Caller(Identity::new("farmer-1", Role::Farmer))
    }

    fn seed_alert(state: &AppState, farmer_id: &str) -> Alert {
        let alert = Alert::new(
            farmer_id,
            AlertType::Warning,
            "Withdrawal Period Ending Soon",
            "2 days remaining",
            AlertSeverity::Medium,
        );
        state.db().unwrap().insert_alert(&alert).unwrap();
        alert
    }

    #[tokio::test]
    async fn test_unread_filter() {
        let state = AppState::for_tests();
        let alert = seed_alert(&state, "farmer-1");

        mark_read(
            State(state.clone()),
            farmer(),
            Path(alert.alert_id.clone()),
        )
        .await
        .unwrap();
        seed_alert(&state, "farmer-1");

        let Json(all) = list(
            State(state.clone()),
            farmer(),
            Query(AlertsQuery { unread: None }),
        )
        .await
        .unwrap();
        assert_eq!(all.count, 2);

        let Json(unread) = list(
            State(state),
            farmer(),
            Query(AlertsQuery {
                unread: Some("true".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(unread.count, 1);
    }

    #[tokio::test]
    async fn test_mark_read_stamps_alert() {
        let state = AppState::for_tests();
        let alert = seed_alert(&state, "farmer-1");

        let Json(response) = mark_read(State(state), farmer(), Path(alert.alert_id))
            .await
            .unwrap();
        assert_eq!(response.message, "Alert marked as read");
        assert!(response.data.read_status);
        assert!(response.data.read_at.is_some());
    }

    #[tokio::test]
    async fn test_foreign_alert_is_forbidden() {
        let state = AppState::for_tests();
        let alert = seed_alert(&state, "farmer-2");

        let err = mark_read(State(state), farmer(), Path(alert.alert_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_unknown_alert_is_not_found() {
        let state = AppState::for_tests();
        let err = mark_read(State(state), farmer(), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
