//! Audit hash verification.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use herdtrace_core::audit::{verify_audit_record, AuditVerification};

use crate::{error::AppError, state::AppState};

use super::DataResponse;

/// Recompute the hash over the stored payload; a mismatch means the record
/// was altered after it was written.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<DataResponse<AuditVerification>>, AppError> {
    let db = state.db()?;
    let verification = verify_audit_record(&db, &hash)?
        .ok_or_else(|| AppError::not_found("Hash not found"))?;
    Ok(Json(DataResponse::new(verification)))
}
