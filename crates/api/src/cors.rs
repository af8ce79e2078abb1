use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use wfg_core::{config::{split_list, AppConfig}, error::ApiError, origin::OriginPolicy};

use crate::state::AppState;

/// The origin policy plus the static CORS headers sent alongside it.
pub struct CorsHeaders {
    policy: OriginPolicy,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsHeaders {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let policy = OriginPolicy::from_config(&cfg.cors)?;
        let allow_methods = HeaderValue::from_str(&split_list(&cfg.cors.allow_methods).join(", "))?;
        let allow_headers = HeaderValue::from_str(&split_list(&cfg.cors.allow_headers).join(", "))?;
        let max_age = HeaderValue::from(cfg.cors.max_age_secs);
        Ok(Self { policy, allow_methods, allow_headers, max_age })
    }

    pub fn policy(&self) -> &OriginPolicy { &self.policy }

    /// Decorates `headers` for a request that carried `origin`.
    pub fn apply(&self, origin: Option<&str>, preflight: bool, headers: &mut HeaderMap) {
        let decision = self.policy.decide(origin);
        match decision.allow_origin.as_deref().map(HeaderValue::from_str) {
            Some(Ok(value)) => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                if decision.allow_credentials {
                    headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
                }
            }
            Some(Err(_)) => tracing::debug!("origin not representable as a header value"),
            None => {
                if origin.is_some() {
                    tracing::debug!(origin, policy = self.policy.name(), "origin not allowed");
                }
            }
        }
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        if preflight {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        }
        if self.policy.varies_by_origin() {
            headers.append(header::VARY, HeaderValue::from_static("origin"));
        }
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
    }
}

/// Outermost middleware: answers preflights and stamps CORS headers on every
/// other response, errors included.
pub async fn cors_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);
    let preflight = req.method() == Method::OPTIONS;

    let mut res = if preflight {
        tracing::debug!(uri = %req.uri(), origin = origin.as_deref(), "preflight");
        StatusCode::NO_CONTENT.into_response()
    } else {
        let res = next.run(req).await;
        if res.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json(res.headers()) {
            ApiError::PayloadTooLarge.into_response()
        } else {
            res
        }
    };
    state.cors.apply(origin.as_deref(), preflight, res.headers_mut());
    res
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
