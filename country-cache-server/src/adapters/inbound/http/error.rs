use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{CycleError, StoreError, ValidationError};

const ERROR_TYPE_BASE: &str = "https://country-cache.example.com/errors";

/// RFC 9457 Problem Details body
/// https://www.rfc-editor.org/rfc/rfc9457.html
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,

    pub title: String,

    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Per-field messages of a rejected write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            errors: None,
        }
    }

    fn of_kind(kind: &str, status: StatusCode) -> Self {
        Self::new(
            format!("{}/{}", ERROR_TYPE_BASE, kind),
            status.canonical_reason().unwrap_or("Error"),
            status,
        )
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// 404 Not Found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::of_kind("not-found", StatusCode::NOT_FOUND)
            .with_detail(format!("{} not found", resource.into()))
    }

    /// 409 Conflict
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::of_kind("conflict", StatusCode::CONFLICT).with_detail(detail)
    }

    /// 400 Bad Request
    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::of_kind("validation", StatusCode::BAD_REQUEST).with_detail(detail)
    }

    /// 503 Service Unavailable
    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::of_kind("source-unavailable", StatusCode::SERVICE_UNAVAILABLE).with_detail(detail)
    }

    /// 500 Internal Server Error
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::of_kind("internal", StatusCode::INTERNAL_SERVER_ERROR).with_detail(detail)
    }
}

impl From<ValidationError> for ProblemDetails {
    fn from(err: ValidationError) -> Self {
        ProblemDetails::validation_error("Validation failed").with_errors(err.fields)
    }
}

impl From<StoreError> for ProblemDetails {
    fn from(err: StoreError) -> Self {
        ProblemDetails::internal_error(format!("Country cache failure: {}", err))
    }
}

impl From<CycleError> for ProblemDetails {
    fn from(err: CycleError) -> Self {
        match err {
            CycleError::SourceUnavailable(source) => ProblemDetails::service_unavailable(format!(
                "Could not fetch data from {}: {}",
                source.source_name(),
                source
            )),
            CycleError::InProgress => {
                ProblemDetails::conflict("A refresh cycle is already in progress")
            }
            CycleError::Storage(store) => store.into(),
            CycleError::Interrupted(detail) => {
                ProblemDetails::internal_error(format!("Refresh did not complete: {}", detail))
            }
        }
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, Json(self)).into_response();

        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );

        response
    }
}
