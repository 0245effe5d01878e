//! HTTP handlers

pub mod status;
pub mod webhook;

// Re-export handlers
pub use status::{root, status};
pub use webhook::{handle_event, handle_github_webhook, handle_transifex_webhook};
