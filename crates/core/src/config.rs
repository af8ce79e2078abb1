use serde::Deserialize;
use std::{env, time::Duration};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSection,
    pub logging: LoggingSection,
    pub http: HttpSection,
    pub cors: CorsSection,
    pub cms: CmsSection,
    pub routes: RoutesSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub env: String,
    pub name: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSection {
    pub max_request_size_bytes: u64,
    pub concurrency_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsSection {
    /// One of `exact`, `suffix`, `wildcard`, `reflect`.
    pub policy: String,
    pub allowed_origins: String,
    pub trusted_suffixes: String,
    pub allow_credentials: bool,
    pub allow_methods: String,
    pub allow_headers: String,
    pub max_age_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmsSection {
    pub base_url: String,
    pub api_token: String,
    pub site_id: String,
    pub collection_id: String,
    pub application_collection_id: String,
    pub timeout_ms: u64,
    /// Also send filters upstream as `filter[..]` parameters. Results are
    /// narrowed locally either way.
    pub server_side_filters: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesSection {
    pub query_require_match: bool,
    pub draft_require_match: bool,
    pub draft_status: String,
}

/// Which configured collection a route reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Primary,
    Application,
}

/// The per-request subset of [`CmsSection`] that must be non-empty.
#[derive(Debug, Clone)]
pub struct CmsTarget<'a> {
    pub token: &'a str,
    pub site_id: &'a str,
    pub collection_id: &'a str,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        // Load .env if present
        let _ = dotenvy::dotenv();
        Self::build(&[])
    }

    /// Defaults (environment first, then built-ins) with `overrides` applied on top.
    pub fn build(overrides: &[(&str, &str)]) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("app.env", env_or("APP_ENV", "local"))?
            .set_default("app.name", env_or("APP_NAME", "webflow-gateway"))?
            .set_default("app.host", env_or("APP_HOST", "0.0.0.0"))?
            .set_default("app.port", env_or("APP_PORT", "8080"))?
            .set_default("logging.log_format", env_or("LOG_FORMAT", "text"))?
            .set_default("http.max_request_size_bytes", env_or("MAX_REQUEST_SIZE_BYTES", "1048576"))?
            .set_default("http.concurrency_limit", env_or("CONCURRENCY_LIMIT", "1024"))?
            .set_default("cors.policy", env_or("CORS_POLICY", "suffix"))?
            .set_default("cors.allowed_origins", env_or("ALLOWED_ORIGINS", "http://localhost:3000"))?
            .set_default("cors.trusted_suffixes", env_or("CORS_TRUSTED_SUFFIXES", ".webflow.io"))?
            .set_default("cors.allow_credentials", env_or("CORS_ALLOW_CREDENTIALS", "false"))?
            .set_default("cors.allow_methods", env_or("CORS_ALLOW_METHODS", "GET,POST,OPTIONS"))?
            .set_default("cors.allow_headers", env_or("CORS_ALLOW_HEADERS", "Content-Type,Authorization"))?
            .set_default("cors.max_age_secs", env_or("CORS_MAX_AGE_SECS", "86400"))?
            .set_default("cms.base_url", env_or("WEBFLOW_API_BASE_URL", "https://api.webflow.com/v2"))?
            .set_default("cms.api_token", env_or("WEBFLOW_API_TOKEN", ""))?
            .set_default("cms.site_id", env_or("WEBFLOW_SITE_ID", ""))?
            .set_default("cms.collection_id", env_or("WEBFLOW_COLLECTION_ID", ""))?
            .set_default("cms.application_collection_id", env_or("WEBFLOW_GENRLAPPL_COLLECTION_ID", ""))?
            .set_default("cms.timeout_ms", env_or("WEBFLOW_TIMEOUT_MS", "10000"))?
            .set_default("cms.server_side_filters", env_or("WEBFLOW_SERVER_SIDE_FILTERS", "true"))?
            .set_default("routes.query_require_match", env_or("QUERY_REQUIRE_MATCH", "false"))?
            .set_default("routes.draft_require_match", env_or("DRAFT_REQUIRE_MATCH", "true"))?
            .set_default("routes.draft_status", env_or("DRAFT_STATUS", "Draft"))?;
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn is_production(&self) -> bool { self.app.env == "production" }
    pub fn cms_timeout(&self) -> Duration { Duration::from_millis(self.cms.timeout_ms) }

    /// Resolves credentials and identifiers for `kind`, or names every missing key.
    pub fn cms_target(&self, kind: CollectionKind) -> Result<CmsTarget<'_>, Vec<&'static str>> {
        let (collection_key, collection_id) = match kind {
            CollectionKind::Primary => ("WEBFLOW_COLLECTION_ID", &self.cms.collection_id),
            CollectionKind::Application => ("WEBFLOW_GENRLAPPL_COLLECTION_ID", &self.cms.application_collection_id),
        };
        let missing: Vec<&'static str> = [
            ("WEBFLOW_API_TOKEN", &self.cms.api_token),
            ("WEBFLOW_SITE_ID", &self.cms.site_id),
            (collection_key, collection_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(CmsTarget {
            token: self.cms.api_token.trim(),
            site_id: self.cms.site_id.trim(),
            collection_id: collection_id.trim(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Splits a comma separated setting, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}
