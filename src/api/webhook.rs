//! Webhook handlers: Transifex completion events, GitHub deliveries

use axum::{
    Json,
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
};
use serde_json::json;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::AppState;
use crate::SharedState;
use crate::commit::{CommitRequest, CommitTarget, commit_translation};
use crate::error::{Result, SyncError};
use crate::signature::{SignatureHeaders, verify_signature};
use crate::translation::fetch_translation;
use crate::tx_config::{fetch_config, resolve_path};
use crate::webhook::WebhookEvent;

/// Handles the Transifex webhook POST request.
///
/// 400 when the signature headers are missing or do not verify, 400 also
/// when a correctly signed body is not a JSON event (a sender error, not a
/// processing failure), 500 when any step of proposing the translation
/// fails, 200 otherwise.
pub async fn handle_transifex_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let delivery_id = Uuid::now_v7();
    let span = info_span!("transifex_webhook", %delivery_id);

    async move {
        let Some(signature_headers) = SignatureHeaders::from_headers(&headers) else {
            warn!("Missing signature headers, rejecting delivery");
            return StatusCode::BAD_REQUEST;
        };
        if !verify_signature(&signature_headers, &body, &state.settings.tx_secret) {
            warn!("Signature verification failed, rejecting delivery");
            return StatusCode::BAD_REQUEST;
        }

        let event: WebhookEvent = match serde_json::from_slice(&body) {
            Ok(event) => event,
            Err(e) => {
                warn!("Could not parse webhook body: {}", e);
                return StatusCode::BAD_REQUEST;
            }
        };
        info!(
            "Handling [{}] for {} [{}]",
            event.event,
            event.config_key(),
            event.language
        );

        match handle_event(&state, &event).await {
            Ok(target) => {
                info!(
                    "Handling transifex webhook successful: {} on '{}'",
                    target.path, target.branch
                );
                StatusCode::OK
            }
            Err(e) => {
                error!(kind = e.kind(), "Handling transifex webhook failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
    .instrument(span)
    .await
}

/// Resolves where the translation goes, then proposes it.
///
/// `.tx/config` and the translation are fetched concurrently; if either
/// fails the other result is dropped and nothing is written.
pub async fn handle_event(state: &AppState, event: &WebhookEvent) -> Result<CommitTarget> {
    let settings = &state.settings;

    let (config, translation) = tokio::try_join!(
        fetch_config(state.repo.as_ref(), &settings.config_branch),
        fetch_translation(
            state.translations.as_ref(),
            &event.project,
            &event.resource,
            &event.language,
        ),
    )?;

    let template = config
        .file_filter(&event.project, &event.resource)
        .ok_or_else(|| {
            SyncError::ConfigError(format!(
                "Not found config in .tx/config for [{}]",
                event.config_key()
            ))
        })?;
    let tx_host = config.host().filter(|h| !h.is_empty()).ok_or_else(|| {
        SyncError::ConfigError("Not found 'host' under [main] in .tx/config".to_string())
    })?;

    let path = resolve_path(template, &event.language);
    let author = translation.author_or(&settings.committer);
    if translation.translator.is_none() {
        info!("No Last-Translator found, committing as {}", author.name);
    }

    let request = CommitRequest {
        tx_host,
        event,
        path: &path,
        content: &translation.content,
        author,
        committer: &settings.committer,
    };
    commit_translation(state.repo.as_ref(), settings, &request).await
}

/// Acknowledges GitHub deliveries; nothing is triggered from them yet.
pub async fn handle_github_webhook(
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let event = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    info!("Received GitHub {:?} event ({} bytes)", event, body.len());
    debug!("{}", String::from_utf8_lossy(&body));

    (
        StatusCode::OK,
        Json(json!({
            "message": "github",
            "event": event,
        })),
    )
}
