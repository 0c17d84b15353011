//! HTTP surface over the [`Crm`](crate::facade::Crm) façade.
//!
//! Handlers stay thin: they parse path and query values, call one façade
//! operation, and translate `Ok(None)` into 404.

pub mod activities;
pub mod contacts;
pub mod customers;
pub mod dashboard;
pub mod leads;
pub mod opportunities;
pub mod router;
pub mod state;

use crate::core::{CrmError, EntityKind};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use router::{build_router, build_router_with_cors, cors_layer};
pub use state::AppState;

#[derive(Debug, Serialize)]
pub struct FieldErrorBody {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorBody>,
}

#[derive(Debug)]
pub enum WebError {
    Crm(CrmError),
    BadRequest(String),
    NotFound(String),
}

pub type WebResult<T> = std::result::Result<T, WebError>;

impl WebError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{kind} {id} not found"))
    }
}

impl From<CrmError> for WebError {
    fn from(err: CrmError) -> Self {
        WebError::Crm(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let mut fields = Vec::new();
        let (status, message, code) = match self {
            WebError::Crm(CrmError::Validation(errors)) => {
                let message = CrmError::Validation(errors.clone()).to_string();
                fields = errors
                    .into_iter()
                    .map(|e| FieldErrorBody {
                        field: e.field,
                        message: e.message,
                    })
                    .collect();
                (StatusCode::UNPROCESSABLE_ENTITY, message, "validation_error")
            }
            WebError::Crm(err @ CrmError::StorageUnavailable(_)) => {
                tracing::error!(error = %err, "storage failure");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string(), "storage_unavailable")
            }
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "bad_request"),
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found"),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            fields,
        });

        (status, body).into_response()
    }
}

/// Parses an enum path segment such as `/by-status/ACTIVE`.
pub(crate) fn parse_segment<T>(raw: &str) -> WebResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| WebError::BadRequest(e.to_string()))
}

/// Turns a façade lookup into a 404 when the row is missing.
pub(crate) fn found<T>(value: Option<T>, kind: EntityKind, id: impl fmt::Display) -> WebResult<T> {
    value.ok_or_else(|| WebError::not_found(kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CustomerStatus;

    #[test]
    fn validation_maps_to_unprocessable() {
        let response = WebError::from(CrmError::validation("companyName", "must not be blank"))
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn storage_maps_to_unavailable() {
        let response = WebError::from(CrmError::storage("disk gone")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn segments_parse_case_insensitively() {
        let status: CustomerStatus = parse_segment("active").unwrap();
        assert_eq!(status, CustomerStatus::Active);
        assert!(matches!(
            parse_segment::<CustomerStatus>("GONE"),
            Err(WebError::BadRequest(_))
        ));
    }
}
