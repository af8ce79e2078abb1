use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wfg_core::config::AppConfig;

pub fn init_tracing(cfg: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.logging.log_format.as_str() {
        "json" => registry.with(fmt::layer().json().with_target(false)).init(),
        _ => registry.with(fmt::layer().with_target(false)).init(),
    }
}

pub const REQUEST_ID_HEADER: &str = "x-request-id";
