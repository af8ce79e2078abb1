use std::{net::SocketAddr, sync::Arc};
use axum::{http, middleware, Router};
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::request_id::{RequestId, MakeRequestId};
use tower_http::{trace::TraceLayer, request_id::{PropagateRequestIdLayer, SetRequestIdLayer}, limit::RequestBodyLimitLayer};
use wfg_cms::{CmsClient, CollectionSource};
use wfg_core::config::AppConfig;
use http::header::HeaderName;
use crate::{state::AppState, cors::{cors_middleware, CorsHeaders}, routes, observability::REQUEST_ID_HEADER};
use uuid::Uuid;

#[derive(Clone)]
struct MakeRequestUuid;
impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        http::HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Production wiring: the router backed by the HTTP CMS client.
pub fn build_app(cfg: Arc<AppConfig>) -> anyhow::Result<AppStateAndRouter> {
    let source = Arc::new(CmsClient::new(cfg.cms.base_url.clone(), cfg.cms_timeout())) as Arc<dyn CollectionSource>;
    build_app_with_source(cfg, source)
}

pub fn build_app_with_source(cfg: Arc<AppConfig>, source: Arc<dyn CollectionSource>) -> anyhow::Result<AppStateAndRouter> {
    let cors = Arc::new(CorsHeaders::from_config(&cfg)?);
    let state = AppState::new(source, cors, cfg.clone());
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &http::Request<_>| {
            let method = req.method().clone();
            let uri = req.uri().path().to_string();
            let request_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            tracing::info_span!("request", %method, %uri, %request_id, status = tracing::field::Empty)
        })
        .on_response(|res: &http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
            let status = res.status().as_u16();
            span.record("status", tracing::field::display(status));
            tracing::info!(parent: span, status, latency_ms = latency.as_millis(), "request.completed");
        });
    let body_limit = RequestBodyLimitLayer::new(cfg.http.max_request_size_bytes as usize);

    let stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id_header.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(trace)
        .layer(body_limit)
        .layer(ConcurrencyLimitLayer::new(cfg.http.concurrency_limit));

    let router = Router::new()
        .merge(routes::routes())
        .fallback(routes::not_found)
        .layer(stack)
        .layer(middleware::from_fn_with_state(state.clone(), cors_middleware))
        .with_state(state.clone());
    Ok(AppStateAndRouter { state, router })
}

#[derive(Clone)]
pub struct AppStateAndRouter { pub state: AppState, pub router: Router }

pub fn server_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.app.host, cfg.app.port).parse()?)
}
