//! Webhook related structures

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Transifex event kinds. Unknown kinds are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    /// All strings translated, not reviewed yet
    TranslationCompleted,
    /// All strings translated and reviewed
    ReviewCompleted,
    FillupCompleted,
    Other(String),
}

impl TxEvent {
    pub fn as_str(&self) -> &str {
        match self {
            TxEvent::TranslationCompleted => "translation_completed",
            TxEvent::ReviewCompleted => "review_completed",
            TxEvent::FillupCompleted => "fillup_completed",
            TxEvent::Other(name) => name,
        }
    }
}

impl From<&str> for TxEvent {
    fn from(name: &str) -> Self {
        match name {
            "translation_completed" => TxEvent::TranslationCompleted,
            "review_completed" => TxEvent::ReviewCompleted,
            "fillup_completed" => TxEvent::FillupCompleted,
            other => TxEvent::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TxEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TxEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(TxEvent::from(name.as_str()))
    }
}

/// Body of a Transifex webhook delivery
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookEvent {
    pub project: String,
    pub resource: String,
    pub language: String,
    pub event: TxEvent,
}

impl WebhookEvent {
    /// `<project>.<resource>`, the `.tx/config` section naming this resource
    pub fn config_key(&self) -> String {
        format!("{}.{}", self.project, self.resource)
    }
}
