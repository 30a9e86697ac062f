//! Azure DevOps commit retrieval and repository listing.
//!
//! Azure DevOps has no diff endpoint. A commit's transcript is rebuilt
//! from the changed-files list plus one content request per edited or
//! added file. Only URL parsing, the credential check and the commit
//! metadata request are fatal; the changes list and every content request
//! degrade to a note inside the transcript.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::url::{normalize_azure_org, parse_azure_url};
use super::{api_error, read_json, ProviderError};
use crate::commit::Commit;

const API_VERSION: &str = "7.1";

/// Files at or above this many characters are not embedded at all.
const MAX_TEXT_CHARS: usize = 30_000;
/// Characters of file content embedded in the transcript.
const EMBED_CHARS: usize = 5_000;

const NOTE_CHANGES_UNAVAILABLE: &str = "[Could not retrieve the list of changed files for this commit]";
const NOTE_NO_CHANGES: &str = "[No file changes found]";
const NOTE_SKIPPED: &str = "[File too large or binary, content skipped]";
const NOTE_UNAVAILABLE: &str = "[Could not fetch file content]";
const TRUNCATED_MARKER: &str = "... (truncated)";
const SEPARATOR: &str = "---";

/// A repository in an Azure DevOps organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    #[allow(dead_code)]
    pub id: String,
    pub name: String,
    pub web_url: String,
    pub project: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryList {
    #[serde(default)]
    value: Vec<RepositoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryEntry {
    id: String,
    name: String,
    #[serde(default)]
    web_url: String,
    project: ProjectRef,
}

#[derive(Debug, Deserialize)]
struct ProjectRef {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    commit_id: String,
    #[serde(default)]
    comment: String,
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    name: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangesResponse {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Change {
    item: ChangeItem,
    change_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeItem {
    path: String,
    url: Option<String>,
    #[serde(default)]
    is_folder: bool,
}

impl Change {
    fn wants_content(&self) -> bool {
        !self.item.is_folder && matches!(self.change_type.as_str(), "edit" | "add")
    }
}

/// Outcome of one per-file content request.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FileContent {
    Text(String),
    Skipped,
    Unavailable,
}

impl FileContent {
    fn classify(body: String) -> Self {
        if body.contains('\0') || body.chars().count() >= MAX_TEXT_CHARS {
            FileContent::Skipped
        } else {
            FileContent::Text(body)
        }
    }

    fn render(&self) -> String {
        match self {
            FileContent::Text(body) => {
                let mut embedded: String = body.chars().take(EMBED_CHARS).collect();
                let truncated = embedded.len() < body.len();
                if !embedded.ends_with('\n') {
                    embedded.push('\n');
                }
                let mut block = format!("```\n{}```", embedded);
                if truncated {
                    block.push('\n');
                    block.push_str(TRUNCATED_MARKER);
                }
                block
            }
            FileContent::Skipped => NOTE_SKIPPED.to_string(),
            FileContent::Unavailable => NOTE_UNAVAILABLE.to_string(),
        }
    }
}

fn render_file_block(change: &Change, content: Option<&FileContent>) -> String {
    let mut block = format!("File: {} [{}]\n", change.item.path, change.change_type);
    if let Some(content) = content {
        block.push_str(&content.render());
        block.push('\n');
    }
    block.push_str(SEPARATOR);
    block
}

fn require_token(token: Option<&str>) -> Result<&str, ProviderError> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ProviderError::MissingCredential("Azure DevOps personal access token"))
}

/// Azure answers a rejected PAT with 401, or with a 203 sign-in page.
fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::NON_AUTHORITATIVE_INFORMATION
}

/// Client for the Azure DevOps Git REST API (api-version 7.1).
#[derive(Debug, Clone)]
pub struct AzureClient {
    http: reqwest::Client,
    base_override: Option<String>,
}

impl AzureClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_override: None,
        }
    }

    /// Send every organization-level request to `base` instead of the
    /// endpoint derived from the URL or organization name.
    pub fn with_base_url(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base_override: Some(base.into().trim_end_matches('/').to_string()),
        }
    }

    fn org_base(&self, resolved: String) -> String {
        self.base_override.clone().unwrap_or(resolved)
    }

    fn get(&self, url: &str, token: &str) -> reqwest::RequestBuilder {
        self.http.get(url).basic_auth("", Some(token))
    }

    /// List the repositories of an organization, sorted by name.
    ///
    /// `org_input` may be a bare organization name or an organization URL
    /// in either host shape. An empty organization yields an empty list.
    #[instrument(skip(self, token))]
    pub async fn list_repositories(
        &self,
        org_input: &str,
        token: Option<&str>,
    ) -> Result<Vec<Repository>, ProviderError> {
        let resolved = normalize_azure_org(org_input)?;
        let token = require_token(token)?;
        let base = self.org_base(resolved.clone());

        let url = format!("{}/_apis/git/repositories?api-version={}", base, API_VERSION);
        debug!(%url, "listing Azure DevOps repositories");
        let response = self.get(&url, token).send().await?;
        let status = response.status();
        debug!(%status, "received repository list response");

        if is_auth_failure(status) {
            return Err(ProviderError::Unauthorized(format!(
                "Azure DevOps rejected the personal access token for {}",
                resolved
            )));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!(
                "organization not found at {}",
                resolved
            )));
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }

        let list: RepositoryList = read_json(response).await?;
        let mut repos: Vec<Repository> = list
            .value
            .into_iter()
            .map(|entry| Repository {
                id: entry.id,
                name: entry.name,
                web_url: entry.web_url,
                project: entry.project.name,
            })
            .collect();
        sort_repositories(&mut repos);
        debug!(count = repos.len(), "listed repositories");
        Ok(repos)
    }

    /// Fetch one commit and reconstruct a diff-like transcript of its changes.
    ///
    /// Requests run strictly in sequence: metadata, changes list, then one
    /// content request per eligible file.
    #[instrument(skip(self, token))]
    pub async fn fetch_commit(
        &self,
        repo_url: &str,
        commit_hash: &str,
        token: Option<&str>,
    ) -> Result<Commit, ProviderError> {
        let repo = parse_azure_url(repo_url)?;
        let token = require_token(token)?;
        debug!(org = %repo.org, project = %repo.project, repo = %repo.repo, "parsed Azure DevOps URL");

        let commit_url = format!(
            "{}/{}/_apis/git/repositories/{}/commits/{}",
            self.org_base(repo.org_base()),
            repo.project,
            repo.repo,
            commit_hash.trim()
        );

        let response = self
            .get(&format!("{}?api-version={}", commit_url, API_VERSION), token)
            .send()
            .await?;
        let status = response.status();
        debug!(%status, "received commit response");
        if is_auth_failure(status) {
            return Err(ProviderError::Unauthorized(format!(
                "Azure DevOps rejected the personal access token for {}/{}",
                repo.org, repo.project
            )));
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        let metadata: CommitResponse = read_json(response).await?;

        let changes_url = format!("{}/changes?api-version={}", commit_url, API_VERSION);
        let transcript = match self.fetch_changes(&changes_url, token).await {
            Ok(changes) if changes.is_empty() => NOTE_NO_CHANGES.to_string(),
            Ok(changes) => self.build_transcript(&changes, token).await,
            Err(err) => {
                warn!(error = %err, "could not retrieve changes list, continuing with metadata only");
                NOTE_CHANGES_UNAVAILABLE.to_string()
            }
        };

        let (author, date) = match metadata.author {
            Some(sig) => (sig.name, sig.date),
            None => (None, None),
        };
        Ok(Commit::from_azure(
            &metadata.commit_id,
            metadata.comment,
            author,
            date,
            transcript,
        ))
    }

    async fn fetch_changes(&self, url: &str, token: &str) -> Result<Vec<Change>, ProviderError> {
        let response = self.get(url, token).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let body: ChangesResponse = read_json(response).await?;
        debug!(changes = body.changes.len(), "received changes list");
        Ok(body.changes)
    }

    async fn build_transcript(&self, changes: &[Change], token: &str) -> String {
        let mut blocks = Vec::with_capacity(changes.len());
        for change in changes {
            let content = if change.wants_content() {
                Some(self.fetch_content(change, token).await)
            } else {
                None
            };
            blocks.push(render_file_block(change, content.as_ref()));
        }
        blocks.join("\n")
    }

    async fn fetch_content(&self, change: &Change, token: &str) -> FileContent {
        let Some(url) = change.item.url.as_deref() else {
            warn!(path = %change.item.path, "changed item has no content URL");
            return FileContent::Unavailable;
        };

        let result = async {
            let response = self
                .get(url, token)
                .header("Accept", "text/plain")
                .send()
                .await?
                .error_for_status()?;
            response.text().await
        }
        .await;

        match result {
            Ok(body) => {
                debug!(path = %change.item.path, bytes = body.len(), "fetched file content");
                FileContent::classify(body)
            }
            Err(err) => {
                warn!(path = %change.item.path, error = %err, "could not fetch file content");
                FileContent::Unavailable
            }
        }
    }
}

/// Case-insensitive by name, ties broken by the exact name.
fn sort_repositories(repos: &mut [Repository]) {
    repos.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}
