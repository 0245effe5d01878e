//! Service settings, read from the environment (and `.env` via dotenv)

use std::path::PathBuf;

use crate::error::{Result, SyncError};
use crate::translation::Attribution;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_CONFIG_BRANCH: &str = "develop";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_TRANSIFEX_API_URL: &str = "https://www.transifex.com/api/2";

/// `owner/name` of a GitHub repository
#[derive(Debug, Clone, PartialEq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    pub fn parse(full_repo: &str) -> Option<Self> {
        let (owner, name) = full_repo.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// GH_REPO
    pub repo: RepoSlug,
    /// GH_BASE_BRANCH, the branch pull requests target
    pub base_branch: String,
    /// GH_CONFIG_BRANCH, the branch `.tx/config` is read from
    pub config_branch: String,
    /// GH_COMMITER_USERNAME / GH_COMMITER_EMAIL
    pub committer: Attribution,
    /// GH_COMMITER_TOKEN
    pub github_token: String,
    pub github_api_url: String,
    /// TX_ORG, used to build translate URLs
    pub tx_org: String,
    pub tx_project: String,
    /// TX_SECRET, the webhook shared secret
    pub tx_secret: String,
    /// TX_CREDENTIAL, `user:password` or a bare API token
    pub tx_credential: String,
    pub tx_api_url: String,
    /// SITE_URL, may contain `<branch>` and `<lang>` placeholders
    pub site_url: String,
    pub bind_address: String,
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            optional(key).ok_or_else(|| {
                SyncError::SettingsError(format!("Missing environment variable '{}'", key))
            })
        };

        let full_repo = required("GH_REPO")?;
        let repo = RepoSlug::parse(&full_repo).ok_or_else(|| {
            SyncError::SettingsError(format!(
                "GH_REPO must look like 'owner/repo', got '{}'",
                full_repo
            ))
        })?;

        Ok(Self {
            repo,
            base_branch: required("GH_BASE_BRANCH")?,
            config_branch: optional("GH_CONFIG_BRANCH")
                .unwrap_or_else(|| DEFAULT_CONFIG_BRANCH.to_string()),
            committer: Attribution {
                name: required("GH_COMMITER_USERNAME")?,
                email: required("GH_COMMITER_EMAIL")?,
            },
            github_token: required("GH_COMMITER_TOKEN")?,
            github_api_url: optional("GH_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            tx_org: required("TX_ORG")?,
            tx_project: required("TX_PROJECT")?,
            tx_secret: required("TX_SECRET")?,
            tx_credential: required("TX_CREDENTIAL")?,
            tx_api_url: optional("TX_API_URL")
                .unwrap_or_else(|| DEFAULT_TRANSIFEX_API_URL.to_string()),
            site_url: required("SITE_URL")?,
            bind_address: optional("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            log_dir: optional("LOG_DIR").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn sample_env() -> HashMap<&'static str, String> {
        [
            ("GH_REPO", "acme/website"),
            ("GH_BASE_BRANCH", "master"),
            ("GH_COMMITER_USERNAME", "tx-bot"),
            ("GH_COMMITER_EMAIL", "tx-bot@example.com"),
            ("GH_COMMITER_TOKEN", "ghp_token"),
            ("TX_ORG", "acme"),
            ("TX_PROJECT", "website"),
            ("TX_SECRET", "s3cret"),
            ("TX_CREDENTIAL", "api:tx_token"),
            ("SITE_URL", "https://<branch>.preview.example.com/<lang>/"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    pub(crate) fn sample_settings() -> Settings {
        let env = sample_env();
        Settings::from_lookup(|k| env.get(k).cloned()).unwrap()
    }

    #[test]
    fn reads_required_and_defaults() {
        let settings = sample_settings();
        assert_eq!(settings.repo.owner, "acme");
        assert_eq!(settings.repo.name, "website");
        assert_eq!(settings.base_branch, "master");
        assert_eq!(settings.config_branch, "develop");
        assert_eq!(settings.github_api_url, "https://api.github.com");
        assert_eq!(settings.bind_address, "127.0.0.1:8888");
        assert_eq!(settings.committer.name, "tx-bot");
        assert!(settings.log_dir.is_none());
    }

    #[test]
    fn missing_variable_is_named() {
        let mut env = sample_env();
        env.remove("TX_SECRET");
        let err = Settings::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("TX_SECRET"), "{}", err);
    }

    #[test]
    fn blank_variable_counts_as_missing() {
        let mut env = sample_env();
        env.insert("SITE_URL", "   ".to_string());
        assert!(Settings::from_lookup(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn rejects_malformed_repo() {
        let mut env = sample_env();
        env.insert("GH_REPO", "website".to_string());
        let err = Settings::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, SyncError::SettingsError(_)));
    }

    #[test]
    fn repo_slug_round_trips_display() {
        let slug = RepoSlug::parse("acme/website").unwrap();
        assert_eq!(slug.to_string(), "acme/website");
        assert_eq!(RepoSlug::parse("acme/web/site"), None);
        assert_eq!(RepoSlug::parse("/website"), None);
    }
}
