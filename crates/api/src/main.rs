use std::sync::Arc;
use tracing::{info, warn};
use wfg_core::config::{AppConfig, CollectionKind};
use api::app::{build_app, server_addr};
use api::observability::init_tracing;
use api::shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Arc::new(AppConfig::load()?);
    init_tracing(&cfg);
    report_cms_config(&cfg);

    let addr = server_addr(&cfg)?;
    let app = build_app(cfg.clone())?;
    info!(%addr, env = %cfg.app.env, cors_policy = app.state.cors.policy().name(), "starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.router).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

// Missing CMS settings only fail the requests that need them, so warn early.
fn report_cms_config(cfg: &AppConfig) {
    for kind in [CollectionKind::Primary, CollectionKind::Application] {
        if let Err(missing) = cfg.cms_target(kind) {
            warn!(?kind, ?missing, production = cfg.is_production(), "cms configuration incomplete; affected routes will return 500");
        }
    }
}
