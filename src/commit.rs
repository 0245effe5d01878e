//! Proposes a translated file as a branch, commit and pull request
//!
//! The sequence is forward-only: nothing is rolled back when a later step
//! fails. Redelivering the same webhook finishes the job because the branch
//! name is derived from the resource and a pull request is only opened when
//! none is open for that branch.

use tracing::{info, warn};

use crate::error::{Result, SyncError};
use crate::github::{FileWrite, GitHubError, NewPullRequest, PullRequestQuery, RepoHost};
use crate::settings::Settings;
use crate::translation::Attribution;
use crate::webhook::WebhookEvent;

const BRANCH_PREFIX: &str = "translate-";

pub fn branch_name(resource: &str) -> String {
    format!("{}{}", BRANCH_PREFIX, resource)
}

/// Deep link into the Transifex editor for one language of one resource
pub fn translate_url(host: &str, org: &str, project: &str, language: &str, resource: &str) -> String {
    format!(
        "{}/{}/{}/translate/#{}/{}",
        host, org, project, language, resource
    )
}

/// Everything the orchestrator needs besides the repository itself
#[derive(Debug, Clone)]
pub struct CommitRequest<'a> {
    /// `host` from the `[main]` section of `.tx/config`
    pub tx_host: &'a str,
    pub event: &'a WebhookEvent,
    /// Resolved path, `<lang>` already substituted
    pub path: &'a str,
    pub content: &'a str,
    pub author: &'a Attribution,
    pub committer: &'a Attribution,
}

/// Names and texts derived from a request; pure, so it is tested on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitTarget {
    pub path: String,
    pub branch: String,
    /// `<owner>:<branch>`, as GitHub expects for pull request heads
    pub head: String,
    pub translate_url: String,
    pub commit_message: String,
    pub pr_title: String,
    pub pr_body: String,
}

impl CommitTarget {
    pub fn new(settings: &Settings, request: &CommitRequest<'_>) -> Self {
        let event = request.event;
        let branch = branch_name(&event.resource);
        let head = format!("{}:{}", settings.repo.owner, branch);
        let translate_url = translate_url(
            request.tx_host,
            &settings.tx_org,
            &event.project,
            &event.language,
            &event.resource,
        );
        let site_url = settings
            .site_url
            .replace("<branch>", &branch)
            .replace("<lang>", &event.language);

        let commit_message = format!(
            "[{}] Updating translations for {}\n\nTranslate-URL: {}",
            event.event, request.path, translate_url
        );
        let pr_title = format!("Translations for {}", request.path);
        let pr_body = format!(
            "* Path: `{}`\n* Language: `{}`\n* Translate-URL: {}\n* Translated-Site-URL: {}\n",
            request.path, event.language, translate_url, site_url
        );

        Self {
            path: request.path.to_string(),
            branch,
            head,
            translate_url,
            commit_message,
            pr_title,
            pr_body,
        }
    }
}

/// Branch, commit, then pull request. Any failure aborts as a CommitError.
pub async fn commit_translation(
    repo: &dyn RepoHost,
    settings: &Settings,
    request: &CommitRequest<'_>,
) -> Result<CommitTarget> {
    let target = CommitTarget::new(settings, request);
    let base = settings.base_branch.as_str();

    match repo.get_branch(&target.branch).await {
        Ok(branch) => info!(
            "Branch '{}' exists at {}, reusing it",
            branch.name, branch.commit.sha
        ),
        Err(GitHubError::NotFound(_)) => {
            info!("Not found '{}' branch, creating from '{}'", target.branch, base);
            repo.create_branch(base, &target.branch)
                .await
                .map_err(|e| SyncError::commit("create branch", e))?;
        }
        Err(e) => return Err(SyncError::commit("get branch", e)),
    }

    let write = FileWrite {
        branch: target.branch.clone(),
        path: target.path.clone(),
        content: request.content.to_string(),
        message: target.commit_message.clone(),
        author: request.author.clone(),
        committer: request.committer.clone(),
    };
    repo.write_file(&write)
        .await
        .map_err(|e| SyncError::commit("write file", e))?;
    info!(
        "Committed '{}' to '{}' as {} <{}>",
        target.path, target.branch, request.author.name, request.author.email
    );

    let query = PullRequestQuery {
        state: "open".to_string(),
        head: target.head.clone(),
        base: base.to_string(),
    };
    let open = repo
        .list_pull_requests(&query)
        .await
        .map_err(|e| SyncError::commit("list pull requests", e))?;

    if open.is_empty() {
        let pr = NewPullRequest {
            title: target.pr_title.clone(),
            head: target.head.clone(),
            base: base.to_string(),
            body: target.pr_body.clone(),
        };
        let created = repo
            .create_pull_request(&pr)
            .await
            .map_err(|e| SyncError::commit("create pull request", e))?;
        info!("Opened pull request #{} {}", created.number, created.html_url);
    } else {
        if open.len() > 1 {
            warn!("{} open pull requests for '{}'", open.len(), target.head);
        }
        info!(
            "Pull request #{} already open for '{}'",
            open[0].number, target.head
        );
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::PullRequest;
    use crate::github::tests::FakeRepo;
    use crate::settings::tests::sample_settings;
    use crate::webhook::TxEvent;

    fn event() -> WebhookEvent {
        WebhookEvent {
            project: "p".to_string(),
            resource: "r".to_string(),
            language: "fr".to_string(),
            event: TxEvent::TranslationCompleted,
        }
    }

    fn jane() -> Attribution {
        Attribution {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
        }
    }

    async fn run(repo: &FakeRepo) -> Result<CommitTarget> {
        let settings = sample_settings();
        let event = event();
        let author = jane();
        let request = CommitRequest {
            tx_host: "https://tx.example",
            event: &event,
            path: "i18n/fr/messages.po",
            content: "msgstr \"Bonjour\"",
            author: &author,
            committer: &settings.committer,
        };
        commit_translation(repo, &settings, &request).await
    }

    #[test]
    fn derives_target_texts() {
        let settings = sample_settings();
        let event = event();
        let author = jane();
        let request = CommitRequest {
            tx_host: "https://tx.example",
            event: &event,
            path: "i18n/fr/messages.po",
            content: "",
            author: &author,
            committer: &author,
        };
        let target = CommitTarget::new(&settings, &request);

        assert_eq!(target.branch, "translate-r");
        assert_eq!(target.head, "acme:translate-r");
        assert_eq!(
            target.translate_url,
            "https://tx.example/acme/p/translate/#fr/r"
        );
        assert_eq!(
            target.commit_message,
            "[translation_completed] Updating translations for i18n/fr/messages.po\n\nTranslate-URL: https://tx.example/acme/p/translate/#fr/r"
        );
        assert_eq!(target.pr_title, "Translations for i18n/fr/messages.po");
        assert_eq!(
            target.pr_body,
            "* Path: `i18n/fr/messages.po`\n\
             * Language: `fr`\n\
             * Translate-URL: https://tx.example/acme/p/translate/#fr/r\n\
             * Translated-Site-URL: https://translate-r.preview.example.com/fr/\n"
        );
    }

    #[tokio::test]
    async fn creates_missing_branch_before_writing() {
        let repo = FakeRepo::default();
        run(&repo).await.unwrap();

        assert_eq!(
            repo.calls(),
            vec![
                "get_branch translate-r",
                "create_branch master translate-r",
                "write_file translate-r i18n/fr/messages.po",
                "list_pull_requests acme:translate-r",
                "create_pull_request acme:translate-r",
            ]
        );
    }

    #[tokio::test]
    async fn reuses_existing_branch() {
        let repo = FakeRepo {
            branch_exists: true,
            ..Default::default()
        };
        run(&repo).await.unwrap();
        assert!(!repo.calls().iter().any(|c| c.starts_with("create_branch")));
    }

    #[tokio::test]
    async fn other_branch_lookup_failure_aborts_before_writing() {
        let repo = FakeRepo {
            branch_lookup_error: Some(500),
            ..Default::default()
        };
        let err = run(&repo).await.unwrap_err();

        assert!(matches!(err, SyncError::CommitError { .. }), "{:?}", err);
        assert_eq!(repo.calls(), vec!["get_branch translate-r"]);
    }

    #[tokio::test]
    async fn writes_with_author_and_committer() {
        let repo = FakeRepo::default();
        run(&repo).await.unwrap();

        let writes = repo.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].author, jane());
        assert_eq!(writes[0].committer.name, "tx-bot");
        assert_eq!(writes[0].content, "msgstr \"Bonjour\"");
        assert!(writes[0].message.starts_with("[translation_completed] "));
    }

    #[tokio::test]
    async fn lists_open_pulls_for_branch_into_base() {
        let repo = FakeRepo::default();
        run(&repo).await.unwrap();

        let queries = repo.pull_queries.lock().unwrap();
        assert_eq!(
            queries.as_slice(),
            &[PullRequestQuery {
                state: "open".to_string(),
                head: "acme:translate-r".to_string(),
                base: "master".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn opens_exactly_one_pull_request_when_none_open() {
        let repo = FakeRepo::default();
        run(&repo).await.unwrap();

        let created = repo.created_pulls.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].title, "Translations for i18n/fr/messages.po");
        assert_eq!(created[0].base, "master");
        assert!(created[0].body.contains("* Language: `fr`"));
    }

    #[tokio::test]
    async fn leaves_existing_pull_request_alone() {
        let repo = FakeRepo {
            open_pulls: vec![PullRequest {
                number: 42,
                html_url: String::new(),
            }],
            ..Default::default()
        };
        run(&repo).await.unwrap();

        assert!(repo.created_pulls.lock().unwrap().is_empty());
        assert_eq!(repo.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn write_failure_keeps_created_branch() {
        let repo = FakeRepo {
            fail_write: true,
            ..Default::default()
        };
        let err = run(&repo).await.unwrap_err();

        assert!(err.to_string().contains("write file"), "{}", err);
        assert_eq!(
            repo.calls(),
            vec![
                "get_branch translate-r",
                "create_branch master translate-r",
                "write_file translate-r i18n/fr/messages.po",
            ]
        );
    }
}
