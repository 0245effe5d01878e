//! Translated content and its attribution

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::transifex::TransifexError;

/// PO header lines are usually quoted: `"Last-Translator: Jane <jane@x.org>, 2024\n"`
static LAST_TRANSLATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^"?Last-Translator: (.*)$"#).unwrap());

/// Anything after the closing `>` (year, team, trailing quote) is ignored
static NAME_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?) <([^<>]*)>").unwrap());

/// Identity credited as commit author or committer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribution {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub content: String,
    pub translator: Option<Attribution>,
}

impl TranslationResult {
    /// The translator if one was found, otherwise the given default identity.
    pub fn author_or<'a>(&'a self, default: &'a Attribution) -> &'a Attribution {
        self.translator.as_ref().unwrap_or(default)
    }
}

/// Read access to a translation service
#[async_trait]
pub trait TranslationSource: Send + Sync {
    /// Rendered translation file for the given coordinates
    async fn translation_content(
        &self,
        project: &str,
        resource: &str,
        language: &str,
    ) -> std::result::Result<String, TransifexError>;
}

pub async fn fetch_translation(
    source: &dyn TranslationSource,
    project: &str,
    resource: &str,
    language: &str,
) -> Result<TranslationResult> {
    let content = source
        .translation_content(project, resource, language)
        .await
        .map_err(|e| {
            SyncError::FetchError(format!(
                "Failed to fetch translation {}.{} [{}]: {}",
                project, resource, language, e
            ))
        })?;
    info!(
        "Fetched translation {}.{} [{}] ({} bytes)",
        project,
        resource,
        language,
        content.len()
    );

    let translator = extract_attribution(&content);
    Ok(TranslationResult {
        content,
        translator,
    })
}

/// Finds the first `Last-Translator: Name <email>` line.
/// A line whose value is not of the `Name <email>` shape yields None.
pub fn extract_attribution(content: &str) -> Option<Attribution> {
    let caps = LAST_TRANSLATOR.captures(content)?;
    let value = caps[1].trim();

    match NAME_EMAIL.captures(value) {
        Some(m) => {
            let attribution = Attribution {
                name: m[1].trim().to_string(),
                email: m[2].trim().to_string(),
            };
            debug!("Last translator: {:?}", attribution);
            Some(attribution)
        }
        None => {
            warn!("Malformed Last-Translator header '{}', ignoring", value);
            None
        }
    }
}
