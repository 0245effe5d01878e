//! Liveness and status endpoints

use axum::{Json, extract::State as AxumState};
use serde::Serialize;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub version: String,
    pub started_at: String,
    pub uptime_seconds: u64,
    pub repo: String,
    pub base_branch: String,
    pub config_branch: String,
    pub tx_project: String,
}

pub async fn root() -> &'static str {
    "tx_github_sync is running"
}

/// GET /status - server uptime and the repository it writes to
pub async fn status(AxumState(state): AxumState<SharedState>) -> Json<ServerStatus> {
    let settings = &state.settings;
    Json(ServerStatus {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at.to_rfc3339(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        repo: settings.repo.to_string(),
        base_branch: settings.base_branch.clone(),
        config_branch: settings.config_branch.clone(),
        tx_project: settings.tx_project.clone(),
    })
}
