//! `.tx/config` lookup: which repository file a Transifex resource maps to
//!
//! Only two directives are understood:
//!
//! ```ini
//! [main]
//! host = https://www.transifex.com
//!
//! [website.messages]
//! file_filter = locale/<lang>/LC_MESSAGES/messages.po
//! ```

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::github::RepoHost;

pub const TX_CONFIG_PATH: &str = ".tx/config";
pub const MAIN_SECTION: &str = "main";
pub const LANG_PLACEHOLDER: &str = "<lang>";

/// Section name to value: `main` holds the host, every other section its
/// file filter. A section seen without a usable directive maps to None.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoConfigMap {
    entries: HashMap<String, Option<String>>,
}

impl RepoConfigMap {
    /// Single-pass, line-oriented parse. Errors cite 1-based line numbers.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries: HashMap<String, Option<String>> = HashMap::new();
        let mut section: Option<String> = None;

        for (idx, raw) in text.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let line_no = idx + 1;

            if line.starts_with('[') && line.ends_with(']') {
                let name = &line[1..line.len() - 1];
                entries.entry(name.to_string()).or_insert(None);
                section = Some(name.to_string());
                continue;
            }

            if line.starts_with("host") {
                match section.as_deref() {
                    None => {
                        return Err(SyncError::ConfigError(format!(
                            "Found 'host' outside of the [main] section at {}:{}",
                            TX_CONFIG_PATH, line_no
                        )));
                    }
                    Some(MAIN_SECTION) => {
                        let host = directive_value(line);
                        entries.insert(MAIN_SECTION.to_string(), Some(host.to_string()));
                    }
                    Some(_) => {}
                }
            } else if line.starts_with("file_filter") {
                let Some(current) = section.as_ref() else {
                    return Err(SyncError::ConfigError(format!(
                        "Found 'file_filter' outside of a [<project_slug>.<resource_slug>] section at {}:{}",
                        TX_CONFIG_PATH, line_no
                    )));
                };
                let path = directive_value(line);
                if !path.is_empty() {
                    entries.insert(current.clone(), Some(path.to_string()));
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    /// Whether a `[key]` section was seen, with or without a value
    pub fn contains_section(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The Transifex host from `[main]`
    pub fn host(&self) -> Option<&str> {
        self.get(MAIN_SECTION)
    }

    /// The path template for `[<project>.<resource>]`
    pub fn file_filter(&self, project: &str, resource: &str) -> Option<&str> {
        self.get(&format!("{}.{}", project, resource))
    }

    /// Number of bracketed sections seen, `main` included
    pub fn section_count(&self) -> usize {
        self.entries.len()
    }
}

/// Text after the first `=`, trimmed; empty if there is no `=`.
fn directive_value(line: &str) -> &str {
    line.split_once('=').map(|(_, v)| v.trim()).unwrap_or("")
}

/// Substitutes every `<lang>` in a file filter.
pub fn resolve_path(template: &str, language: &str) -> String {
    template.replace(LANG_PLACEHOLDER, language)
}

/// Reads and parses `.tx/config` from the given branch of the repository.
pub async fn fetch_config(repo: &dyn RepoHost, branch: &str) -> Result<RepoConfigMap> {
    let text = repo
        .get_file_contents(branch, TX_CONFIG_PATH)
        .await
        .map_err(|e| {
            SyncError::FetchError(format!(
                "Failed to read {} from branch '{}': {}",
                TX_CONFIG_PATH, branch, e
            ))
        })?;
    debug!("{} on '{}':\n{}", TX_CONFIG_PATH, branch, text);

    let config = RepoConfigMap::parse(&text)?;
    info!(
        "Loaded {} with {} sections from branch '{}'",
        TX_CONFIG_PATH,
        config.section_count(),
        branch
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::tests::FakeRepo;

    const CONFIG: &str = "[main]\nhost = X\n\n[p.r]\nfile_filter = path/<lang>/file.po\nsource_file = path/en/file.po\ntype = PO\n";

    #[test]
    fn parses_host_and_file_filter() {
        let config = RepoConfigMap::parse(CONFIG).unwrap();
        assert_eq!(config.host(), Some("X"));
        assert_eq!(config.file_filter("p", "r"), Some("path/<lang>/file.po"));
        assert_eq!(config.section_count(), 2);
    }

    #[test]
    fn file_filter_before_any_section_cites_line() {
        let err = RepoConfigMap::parse("# header\nfile_filter = a/<lang>.po\n[p.r]\n").unwrap_err();
        match err {
            SyncError::ConfigError(msg) => assert!(msg.ends_with(".tx/config:2"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn host_before_any_section_is_an_error() {
        let err = RepoConfigMap::parse("host = X\n[main]\n").unwrap_err();
        assert!(err.to_string().contains(".tx/config:1"), "{}", err);
    }

    #[test]
    fn empty_file_filter_leaves_entry_unset() {
        let config = RepoConfigMap::parse("[p.r]\nfile_filter =\n").unwrap();
        assert!(config.contains_section("p.r"));
        assert_eq!(config.file_filter("p", "r"), None);
    }

    #[test]
    fn empty_file_filter_keeps_earlier_value() {
        let config =
            RepoConfigMap::parse("[p.r]\nfile_filter = a/<lang>.po\nfile_filter = \n").unwrap();
        assert_eq!(config.file_filter("p", "r"), Some("a/<lang>.po"));
    }

    #[test]
    fn host_outside_main_is_ignored() {
        let config = RepoConfigMap::parse("[p.r]\nhost = Y\n").unwrap();
        assert_eq!(config.host(), None);
        assert_eq!(config.get("p.r"), None);
    }

    #[test]
    fn reopening_a_section_keeps_its_value() {
        let text = "[p.r]\nfile_filter = a/<lang>.po\n[main]\nhost = X\n[p.r]\n";
        let config = RepoConfigMap::parse(text).unwrap();
        assert_eq!(config.file_filter("p", "r"), Some("a/<lang>.po"));
    }

    #[test]
    fn value_is_text_after_first_equals() {
        let config = RepoConfigMap::parse("[main]\nhost = https://tx.example/?a=b\n").unwrap();
        assert_eq!(config.host(), Some("https://tx.example/?a=b"));
    }

    #[test]
    fn handles_crlf_line_endings() {
        let config = RepoConfigMap::parse("[main]\r\nhost = X\r\n[p.r]\r\nfile_filter = f/<lang>\r\n")
            .unwrap();
        assert_eq!(config.host(), Some("X"));
        assert_eq!(config.file_filter("p", "r"), Some("f/<lang>"));
    }

    #[test]
    fn unrecognised_lines_are_ignored() {
        let config = RepoConfigMap::parse("; comment\n[p.r]\n  file_filter = x\nlang_map = a:b\n").unwrap();
        assert_eq!(config.file_filter("p", "r"), None);
    }

    #[test]
    fn resolves_lang_placeholder() {
        assert_eq!(resolve_path("locale/<lang>/app.po", "fr"), "locale/fr/app.po");
        assert_eq!(resolve_path("<lang>/<lang>.po", "de"), "de/de.po");
    }

    #[tokio::test]
    async fn fetches_from_configured_branch() {
        let repo = FakeRepo::default().with_file("develop", TX_CONFIG_PATH, CONFIG);
        let config = fetch_config(&repo, "develop").await.unwrap();

        assert_eq!(config.host(), Some("X"));
        assert_eq!(repo.calls(), vec!["get_file_contents develop .tx/config"]);
    }

    #[tokio::test]
    async fn read_failure_is_a_fetch_error() {
        let repo = FakeRepo::default();
        let err = fetch_config(&repo, "develop").await.unwrap_err();
        assert!(matches!(err, SyncError::FetchError(_)), "{:?}", err);
    }
}
