use crate::ai::{client::LanguageModelClient, research::ResearchClient};
use crate::config::Config;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

/// The AI collaborators, injected as trait objects so tests can substitute
/// fakes without touching process-wide state.
#[derive(Clone)]
pub struct AiClients {
    pub llm: Arc<dyn LanguageModelClient>,
    pub research: Arc<dyn ResearchClient>,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub ai: AiClients,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for AiClients {
    fn from_ref(state: &AppState) -> Self {
        state.ai.clone()
    }
}
