use std::sync::Arc;

use tracing::{self, info};
use tx_github_sync::error::SyncError;
use tx_github_sync::github::GitHubClient;
use tx_github_sync::logging::{FileLogger, setup_logging};
use tx_github_sync::settings::Settings;
use tx_github_sync::transifex::TransifexClient;
use tx_github_sync::{AppState, build_router};

fn build_state(settings: Settings) -> Result<AppState, SyncError> {
    let repo = GitHubClient::new(
        &settings.github_api_url,
        settings.repo.clone(),
        &settings.github_token,
    )
    .map_err(|e| SyncError::SettingsError(format!("Failed to build GitHub client: {}", e)))?;
    let translations = TransifexClient::new(&settings.tx_api_url, &settings.tx_credential)
        .map_err(|e| {
            SyncError::SettingsError(format!("Failed to build Transifex client: {}", e))
        })?;

    Ok(AppState::new(settings, Arc::new(repo), Arc::new(translations)))
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let file_logger = settings.log_dir.clone().map(FileLogger::new);
    let _log_guard = match setup_logging(file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up file logging: {}", e);
            std::process::exit(1);
        }
    };

    let bind_address = settings.bind_address.clone();
    info!(
        "Proposing Transifex project '{}' translations to {} (base '{}')",
        settings.tx_project, settings.repo, settings.base_branch
    );

    let state = match build_state(settings) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let app = build_router(state);

    info!("Listening on {}", bind_address);
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
