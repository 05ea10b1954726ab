//! HTTP route handlers.
//!
//! Authentication happens upstream; requests arrive with the caller's
//! identity on `X-User-Id`/`X-User-Role` headers and handlers trust them.

pub mod alerts;
pub mod animals;
pub mod audit;
pub mod consultations;
pub mod drugs;
pub mod health;
pub mod treatments;
pub mod vets;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName},
};
use herdtrace_core::{Identity, Role};
use serde::Serialize;

use crate::error::AppError;

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
pub const USER_ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");

/// The authenticated caller, pulled off the identity headers.
pub struct Caller(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, &USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized access".to_string()))?;
        let role = header_value(parts, &USER_ROLE_HEADER)
            .and_then(|value| Role::parse(&value))
            .ok_or_else(|| AppError::Unauthorized("Unauthorized access".to_string()))?;
        Ok(Caller(Identity::new(&user_id, role)))
    }
}

fn header_value(parts: &Parts, name: &HeaderName) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Envelope for single-record responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Envelope for mutations that confirm with a human-readable message.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T> MessageResponse<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<Caller, AppError> {
        let (mut parts, _) = req.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_caller_from_headers() {
        let req = Request::builder()
            .header("x-user-id", "farmer-1")
            .header("x-user-role", "farmer")
            .body(())
            .unwrap();
        let Caller(identity) = extract(req).await.unwrap();
        assert_eq!(identity.user_id, "farmer-1");
        assert_eq!(identity.role, Role::Farmer);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let req = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(req).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthorized() {
        let req = Request::builder()
            .header("x-user-id", "user-1")
            .header("x-user-role", "supervisor")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(req).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
