use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use wfg_cms::{CollectionItem, FilterCriteria};
use wfg_core::timestamp;

/// Successful response body. Failures are rendered by `ApiError`.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CollectionItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Upstream item count before local filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterCriteria>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub timestamp: String,
}

impl Envelope {
    fn empty() -> Self {
        Self {
            success: true,
            message: None,
            items: None,
            count: None,
            total: None,
            data: None,
            filters: None,
            payload: None,
            timestamp: timestamp(),
        }
    }

    pub fn items(items: Vec<CollectionItem>, total: usize, filters: FilterCriteria) -> Self {
        Self { count: Some(items.len()), items: Some(items), total: Some(total), filters: Some(filters), ..Self::empty() }
    }

    pub fn data(data: Value) -> Self {
        Self { data: Some(data), ..Self::empty() }
    }

    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// Echo of what the caller sent.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
