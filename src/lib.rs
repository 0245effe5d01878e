pub mod api;
pub mod commit;
pub mod error;
pub mod github;
pub mod logging;
pub mod settings;
pub mod signature;
pub mod transifex;
pub mod translation;
pub mod tx_config;
pub mod webhook;

use axum::{Router, routing};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

use github::RepoHost;
use settings::Settings;
use translation::TranslationSource;

/// Shared, read-only state. Clients are injected so tests can swap in fakes.
pub struct AppState {
    pub settings: Settings,
    pub repo: Arc<dyn RepoHost>,
    pub translations: Arc<dyn TranslationSource>,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        repo: Arc<dyn RepoHost>,
        translations: Arc<dyn TranslationSource>,
    ) -> Self {
        Self {
            settings,
            repo,
            translations,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(api::root))
        .route("/status", routing::get(api::status))
        .route("/transifex", routing::post(api::handle_transifex_webhook))
        .route("/github", routing::post(api::handle_github_webhook))
        .with_state(state)
}
