use crate::{envelope::Envelope, extract, state::AppState};
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use wfg_cms::{
    select, CmsError, CollectionItem, CollectionPage, CollectionQuery, FilterCriteria, APPLICATION_STATUS_FIELD,
    USER_NAME_FIELD,
};
use wfg_core::{
    config::{CmsTarget, CollectionKind},
    error::{ApiError, ApiResult},
};

const NO_DRAFT: &str = "No Application is in Draft Stage";
const NO_MATCH: &str = "No matching items";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/readiness", get(readiness))
        .route("/query", get(query_by_params).post(trigger).fallback(method_not_allowed))
        .route("/query/:identifier", get(query_by_path).fallback(method_not_allowed))
        .route("/applications/:identifier", get(application_by_path).fallback(method_not_allowed))
        .route("/applications/:identifier/draft", get(draft_lookup).fallback(method_not_allowed))
        .route("/webhook", get(collection_snapshot).post(webhook).fallback(method_not_allowed))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

async fn readiness() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Result of one fetch-and-filter pass.
struct Lookup {
    items: Vec<CollectionItem>,
    total: usize,
}

/// Resolves the CMS coordinates for `kind`. Runs before any request
/// validation so a misconfigured deployment always answers 500.
fn cms_target(state: &AppState, kind: CollectionKind) -> ApiResult<CmsTarget<'_>> {
    state.config().cms_target(kind).map_err(|missing| {
        tracing::error!(?missing, ?kind, "cms configuration incomplete");
        ApiError::Configuration { missing }
    })
}

async fn fetch_page(state: &AppState, target: CmsTarget<'_>, criteria: &FilterCriteria) -> ApiResult<CollectionPage> {
    let mut query = CollectionQuery::new(target.collection_id, target.token).site(target.site_id);
    if state.config().cms.server_side_filters {
        query = query.filters(criteria.clone());
    }
    state.source.fetch_items(&query).await.map_err(|e| {
        tracing::error!(error = %e, collection = %query.collection_id, "collection fetch failed");
        upstream_error(e)
    })
}

/// Fetches the target collection and narrows it locally with `criteria`.
///
/// Upstream filtering is best effort, so the returned set is always treated
/// as a superset and re-checked here.
async fn lookup(state: &AppState, target: CmsTarget<'_>, criteria: &FilterCriteria) -> ApiResult<Lookup> {
    let collection = target.collection_id;
    let page = fetch_page(state, target, criteria).await?;
    let total = page.len();
    let items = select(page.items, criteria);
    tracing::info!(collection, total, matched = items.len(), "collection filtered");
    Ok(Lookup { items, total })
}

fn upstream_error(e: CmsError) -> ApiError {
    match e {
        CmsError::Status { status, body } => ApiError::Upstream { status: Some(status), details: body },
        CmsError::Timeout => ApiError::UpstreamTimeout,
        CmsError::Transport(msg) | CmsError::Decode(msg) => ApiError::Upstream { status: None, details: msg },
    }
}

async fn respond(
    state: &AppState,
    target: CmsTarget<'_>,
    criteria: FilterCriteria,
    require_match: Option<&'static str>,
) -> ApiResult<Envelope> {
    let found = lookup(state, target, &criteria).await?;
    if let Some(message) = require_match {
        if found.items.is_empty() {
            tracing::debug!(?criteria, "no match on a route that requires one");
            return Err(ApiError::NotFound(message.into()));
        }
    }
    Ok(Envelope::items(found.items, found.total, criteria))
}

async fn query_by_params(State(state): State<AppState>, RawQuery(raw): RawQuery) -> ApiResult<Envelope> {
    let target = cms_target(&state, CollectionKind::Primary)?;
    let criteria = extract::from_query(raw.as_deref());
    tracing::info!(?criteria, "query by parameters");
    if criteria.is_unconstrained() {
        tracing::warn!("query without filters rejected");
        return Err(ApiError::Validation { missing: vec![USER_NAME_FIELD, APPLICATION_STATUS_FIELD] });
    }
    let require = state.config().routes.query_require_match.then_some(NO_MATCH);
    respond(&state, target, criteria, require).await
}

async fn query_by_path(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Envelope> {
    let target = cms_target(&state, CollectionKind::Primary)?;
    let criteria = path_criteria(path_identifier(path)?, raw.as_deref())?;
    tracing::info!(?criteria, "query by path");
    let require = state.config().routes.query_require_match.then_some(NO_MATCH);
    respond(&state, target, criteria, require).await
}

async fn application_by_path(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Envelope> {
    let target = cms_target(&state, CollectionKind::Application)?;
    let criteria = path_criteria(path_identifier(path)?, raw.as_deref())?;
    tracing::info!(?criteria, "application lookup");
    let require = state.config().routes.query_require_match.then_some(NO_MATCH);
    respond(&state, target, criteria, require).await
}

/// Draft lookup. `application-status` in the query string overrides the
/// configured draft status.
async fn draft_lookup(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Envelope> {
    let target = cms_target(&state, CollectionKind::Application)?;
    let route_cfg = &state.config().routes;
    let identifier = path_identifier(path)?;
    let status = extract::from_query(raw.as_deref()).status.or_else(|| Some(route_cfg.draft_status.clone()));
    let criteria = FilterCriteria::new(Some(identifier), status);
    if criteria.identifier.is_none() {
        return Err(ApiError::Validation { missing: vec![USER_NAME_FIELD] });
    }
    tracing::info!(?criteria, "draft lookup");
    let require = route_cfg.draft_require_match.then_some(NO_DRAFT);
    respond(&state, target, criteria, require).await
}

fn path_identifier(path: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    path.map(|Path(identifier)| identifier).map_err(|e| {
        tracing::debug!(error = %e, "undecodable path identifier");
        ApiError::Validation { missing: vec![USER_NAME_FIELD] }
    })
}

// The path segment is the identifier; the query string may add a status.
fn path_criteria(identifier: String, raw_query: Option<&str>) -> ApiResult<FilterCriteria> {
    let criteria = FilterCriteria::new(Some(identifier), None).or(extract::from_query(raw_query));
    if criteria.identifier.is_none() {
        return Err(ApiError::Validation { missing: vec![USER_NAME_FIELD] });
    }
    Ok(criteria)
}

/// Button trigger: fire and report. Zero matches is still a success.
async fn trigger(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Envelope> {
    let target = cms_target(&state, CollectionKind::Primary)?;
    let payload = extract::lenient_body(&headers, &body);
    let criteria = extract::from_query(raw.as_deref()).or(extract::from_body(&payload));
    tracing::info!(?criteria, "trigger received");
    let envelope = respond(&state, target, criteria, None).await?;
    Ok(envelope.message("Webhook triggered successfully").payload(payload))
}

/// Site-builder webhook: re-reads the whole primary collection.
async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> ApiResult<Envelope> {
    let target = cms_target(&state, CollectionKind::Primary)?;
    let payload = extract::lenient_body(&headers, &body);
    tracing::info!(bytes = body.len(), "webhook received");
    let found = lookup(&state, target, &FilterCriteria::default()).await?;
    let data = json!({
        "webhook": payload,
        "itemCount": found.items.len(),
        "items": found.items,
    });
    Ok(Envelope::data(data).message("Webhook processed successfully"))
}

/// Manual pull of the primary collection, returned as the CMS sent it.
async fn collection_snapshot(State(state): State<AppState>) -> ApiResult<Envelope> {
    let target = cms_target(&state, CollectionKind::Primary)?;
    let page = fetch_page(&state, target, &FilterCriteria::default()).await?;
    tracing::info!(items = page.len(), "collection snapshot");
    let data = serde_json::to_value(&page).map_err(|e| {
        tracing::error!(error = %e, "collection snapshot not serializable");
        ApiError::Internal
    })?;
    Ok(Envelope::data(data))
}
