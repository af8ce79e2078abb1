use std::sync::Arc;
use wfg_cms::CollectionSource;
use wfg_core::config::AppConfig;

use crate::cors::CorsHeaders;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn CollectionSource>,
    pub cors: Arc<CorsHeaders>,
    pub cfg: Arc<AppConfig>,
}

impl AppState {
    pub fn new(source: Arc<dyn CollectionSource>, cors: Arc<CorsHeaders>, cfg: Arc<AppConfig>) -> Self {
        Self { source, cors, cfg }
    }
    pub fn config(&self) -> &AppConfig { &self.cfg }
}
