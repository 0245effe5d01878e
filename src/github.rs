//! GitHub repository operations used to propose translations
//!
//! [`RepoHost`] is the seam the orchestrator talks to; [`GitHubClient`]
//! implements it on top of the REST v3 API with a personal access token.

use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::settings::RepoSlug;
use crate::translation::Attribution;

const USER_AGENT: &str = concat!("tx_github_sync/", env!("CARGO_PKG_VERSION"));
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    /// The only condition callers branch on (missing branch or file)
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitHub API returned {status} for {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: CommitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub html_url: String,
}

/// One file written as one commit
#[derive(Debug, Clone, PartialEq)]
pub struct FileWrite {
    pub branch: String,
    pub path: String,
    pub content: String,
    pub message: String,
    pub author: Attribution,
    pub committer: Attribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestQuery {
    pub state: String,
    /// `owner:branch`
    pub head: String,
    pub base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Raw text of a file on a branch
    async fn get_file_contents(&self, branch: &str, path: &str) -> Result<String, GitHubError>;

    /// Fails with [`GitHubError::NotFound`] if the branch does not exist
    async fn get_branch(&self, branch: &str) -> Result<Branch, GitHubError>;

    /// Creates `branch` pointing at the head of `base`
    async fn create_branch(&self, base: &str, branch: &str) -> Result<(), GitHubError>;

    /// Creates or updates a file
    async fn write_file(&self, write: &FileWrite) -> Result<(), GitHubError>;

    async fn list_pull_requests(
        &self,
        query: &PullRequestQuery,
    ) -> Result<Vec<PullRequest>, GitHubError>;

    async fn create_pull_request(&self, pr: &NewPullRequest) -> Result<PullRequest, GitHubError>;
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    sha: String,
}

#[derive(Debug, Serialize)]
struct CreateRef<'a> {
    #[serde(rename = "ref")]
    reference: String,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    author: &'a Attribution,
    committer: &'a Attribution,
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    repo: RepoSlug,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, repo: RepoSlug, token: &str) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo,
            token: token.to_string(),
        })
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, self.repo.owner, self.repo.name, tail
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.request_accepting(method, url, JSON_MEDIA_TYPE)
    }

    fn request_accepting(&self, method: Method, url: &str, accept: &str) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, accept)
    }

    /// Sends a request, mapping 404 to NotFound and other failures to Api.
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<reqwest::Response, GitHubError> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                url: url.to_string(),
                message,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, GitHubError> {
        Ok(self.send(request, url).await?.json().await?)
    }

    /// Blob sha of an existing file, required by GitHub to overwrite it.
    async fn existing_file_sha(&self, branch: &str, path: &str) -> Result<Option<String>, GitHubError> {
        let url = self.repo_url(&format!("contents/{}", path));
        let request = self.request(Method::GET, &url).query(&[("ref", branch)]);
        match self.send_json::<ContentEntry>(request, &url).await {
            Ok(entry) => Ok(Some(entry.sha)),
            Err(GitHubError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn get_file_contents(&self, branch: &str, path: &str) -> Result<String, GitHubError> {
        let url = self.repo_url(&format!("contents/{}", path));
        let request = self
            .request_accepting(Method::GET, &url, RAW_MEDIA_TYPE)
            .query(&[("ref", branch)]);
        Ok(self.send(request, &url).await?.text().await?)
    }

    async fn get_branch(&self, branch: &str) -> Result<Branch, GitHubError> {
        let url = self.repo_url(&format!("branches/{}", branch));
        let request = self.request(Method::GET, &url);
        self.send_json(request, &url).await
    }

    async fn create_branch(&self, base: &str, branch: &str) -> Result<(), GitHubError> {
        let base_url = self.repo_url(&format!("git/ref/heads/{}", base));
        let base_ref: GitRef = self
            .send_json(self.request(Method::GET, &base_url), &base_url)
            .await?;

        let url = self.repo_url("git/refs");
        let body = CreateRef {
            reference: format!("refs/heads/{}", branch),
            sha: &base_ref.object.sha,
        };
        let request = self.request(Method::POST, &url).json(&body);
        self.send(request, &url).await?;
        Ok(())
    }

    async fn write_file(&self, write: &FileWrite) -> Result<(), GitHubError> {
        let sha = self.existing_file_sha(&write.branch, &write.path).await?;

        let url = self.repo_url(&format!("contents/{}", write.path));
        let body = PutContents {
            message: &write.message,
            content: BASE64_STANDARD.encode(write.content.as_bytes()),
            branch: &write.branch,
            sha,
            author: &write.author,
            committer: &write.committer,
        };
        let request = self.request(Method::PUT, &url).json(&body);
        self.send(request, &url).await?;
        Ok(())
    }

    async fn list_pull_requests(
        &self,
        query: &PullRequestQuery,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        let url = self.repo_url("pulls");
        let request = self.request(Method::GET, &url).query(query);
        self.send_json(request, &url).await
    }

    async fn create_pull_request(&self, pr: &NewPullRequest) -> Result<PullRequest, GitHubError> {
        let url = self.repo_url("pulls");
        let request = self.request(Method::POST, &url).json(pr);
        self.send_json(request, &url).await
    }
}
