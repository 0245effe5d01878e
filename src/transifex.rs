//! Minimal Transifex API v2 client

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::translation::TranslationSource;

const USER_AGENT: &str = concat!("tx_github_sync/", env!("CARGO_PKG_VERSION"));

/// Username Transifex expects when authenticating with a bare API token
const TOKEN_USERNAME: &str = "api";

#[derive(Debug, thiserror::Error)]
pub enum TransifexError {
    #[error("Transifex API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transifex request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TranslationFile {
    content: String,
}

pub struct TransifexClient {
    http: reqwest::Client,
    api_url: String,
    username: String,
    password: String,
}

impl TransifexClient {
    /// `credential` is either `user:password` or a bare API token.
    pub fn new(api_url: &str, credential: &str) -> Result<Self, TransifexError> {
        let (username, password) = credential
            .split_once(':')
            .unwrap_or((TOKEN_USERNAME, credential));
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn translation_url(&self, project: &str, resource: &str, language: &str) -> String {
        format!(
            "{}/project/{}/resource/{}/translation/{}/",
            self.api_url, project, resource, language
        )
    }
}

#[async_trait]
impl TranslationSource for TransifexClient {
    async fn translation_content(
        &self,
        project: &str,
        resource: &str,
        language: &str,
    ) -> Result<String, TransifexError> {
        let url = self.translation_url(project, resource, language);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(TransifexError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let file: TranslationFile = response.json().await?;
        Ok(file.content)
    }
}
