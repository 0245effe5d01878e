/// Custom error type for tx_github_sync operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Fetch failed: {0}")]
    FetchError(String),

    #[error("Commit failed: {operation}\n{message}")]
    CommitError { operation: String, message: String },

    #[error("Settings error: {0}")]
    SettingsError(String),
}

impl SyncError {
    /// Short name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::ConfigError(_) => "config",
            SyncError::FetchError(_) => "fetch",
            SyncError::CommitError { .. } => "commit",
            SyncError::SettingsError(_) => "settings",
        }
    }

    pub(crate) fn commit(operation: &str, err: impl std::fmt::Display) -> Self {
        SyncError::CommitError {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

/// Helper type for Results that use SyncError
pub type Result<T> = std::result::Result<T, SyncError>;
