use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

use crate::timestamp;

// Upstream error text is surfaced for diagnostics, but never unbounded.
const MAX_DETAIL_LEN: usize = 512;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required configuration")] Configuration { missing: Vec<&'static str> },
    #[error("Missing required parameters")] Validation { missing: Vec<&'static str> },
    #[error("Failed to fetch collection data")] Upstream { status: Option<u16>, details: String },
    #[error("Upstream request timed out")] UpstreamTimeout,
    #[error("{0}")] NotFound(String),
    #[error("Method Not Allowed")] MethodNotAllowed,
    #[error("Payload Too Large")] PayloadTooLarge,
    #[error("Internal Server Error")] Internal,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    timestamp: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Configuration { .. } | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Configuration { .. } => "configuration_error",
            ApiError::Validation { .. } => "missing_parameters",
            ApiError::Upstream { .. } => "upstream_error",
            ApiError::UpstreamTimeout => "upstream_timeout",
            ApiError::NotFound(_) => "not_found",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::Internal => "internal_error",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::Configuration { missing } => Some(format!("missing: {}", missing.join(", "))),
            ApiError::Validation { missing } => Some(format!("provide at least one of: {}", missing.join(", "))),
            ApiError::Upstream { status: Some(status), details } => Some(truncate(format!("CMS API error: {status} {details}"))),
            ApiError::Upstream { status: None, details } => Some(truncate(details.clone())),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.to_string();
        let body = ErrorBody { success: false, error: &msg, code: self.code(), details: self.details(), timestamp: timestamp() };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn truncate(mut s: String) -> String {
    if s.len() > MAX_DETAIL_LEN {
        let mut end = MAX_DETAIL_LEN;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
        s.push('…');
    }
    s
}
