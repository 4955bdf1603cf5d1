use crate::config::AppConfig;
use scoring::store::InMemoryStore;
use scoring::ScoringService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub scoring: Arc<ScoringService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let scoring = ScoringService::new(Arc::new(InMemoryStore::new()), config.dispatch.clone());
        Self {
            config: Arc::new(config),
            scoring: Arc::new(scoring),
        }
    }
}
