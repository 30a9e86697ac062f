use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::url::parse_github_url;
use super::{api_error, read_json, ProviderError};
use crate::commit::Commit;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Placeholder for files GitHub returns without a patch.
const NO_PATCH_PLACEHOLDER: &str = "[Binary or Large File]";

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    name: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: String,
    status: String,
    patch: Option<String>,
}

/// Client for the GitHub REST single-commit endpoint.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    pub fn with_api_url(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { http, api_url }
    }

    /// Fetch one commit and fold its per-file patches into a single diff.
    ///
    /// The token is optional; public repositories work without one. One
    /// attempt, no retry.
    #[instrument(skip(self, token), fields(authenticated = token.is_some()))]
    pub async fn fetch_commit(
        &self,
        repo_url: &str,
        commit_hash: &str,
        token: Option<&str>,
    ) -> Result<Commit, ProviderError> {
        let repo = parse_github_url(repo_url)?;
        debug!(owner = %repo.owner, repo = %repo.repo, "parsed GitHub URL");

        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_url,
            repo.owner,
            repo.repo,
            commit_hash.trim()
        );

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            request = request.header("Authorization", format!("token {}", token.trim()));
        }

        debug!("fetching commit from GitHub API");
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, "received GitHub response");
        if !status.is_success() {
            return Err(match api_error(response).await {
                ProviderError::Api { status, message } if status == StatusCode::UNAUTHORIZED => {
                    ProviderError::Unauthorized(message)
                }
                other => other,
            });
        }

        let body: CommitResponse = read_json(response).await?;
        debug!(sha = %body.sha, files = body.files.len(), "received commit");

        let diff = build_diff(&body.files);
        let (author, date) = match body.commit.author {
            Some(sig) => (sig.name, sig.date),
            None => (None, None),
        };

        Ok(Commit::from_github(&body.sha, body.commit.message, author, date, diff))
    }
}

/// One `File: {path} ({status})` block per file, blank line between blocks.
fn build_diff(files: &[FileEntry]) -> String {
    files
        .iter()
        .map(|file| {
            let patch = file.patch.as_deref().unwrap_or(NO_PATCH_PLACEHOLDER);
            format!("File: {} ({})\n{}", file.filename, file.status, patch)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitSource;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::with_api_url(reqwest::Client::new(), server.uri())
    }

    fn commit_body() -> serde_json::Value {
        json!({
            "sha": "abcdef1234567890",
            "commit": {
                "message": "Add login page",
                "author": { "name": "alice", "date": "2024-05-01T10:00:00Z" }
            },
            "files": [
                { "filename": "src/login.rs", "status": "added", "patch": "@@ -0,0 +1 @@\n+fn login() {}" },
                { "filename": "logo.png", "status": "modified" }
            ]
        })
    }

    #[test]
    fn test_build_diff_format() {
        let files = vec![
            FileEntry {
                filename: "a.rs".to_string(),
                status: "modified".to_string(),
                patch: Some("+x".to_string()),
            },
            FileEntry {
                filename: "b.bin".to_string(),
                status: "added".to_string(),
                patch: None,
            },
        ];
        assert_eq!(
            build_diff(&files),
            "File: a.rs (modified)\n+x\n\nFile: b.bin (added)\n[Binary or Large File]"
        );
        assert_eq!(build_diff(&[]), "");
    }

    #[tokio::test]
    async fn test_fetch_commit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/commits/abcdef1"))
            .and(header("Accept", "application/vnd.github.v3+json"))
            .and(header("Authorization", "token secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(commit_body()))
            .expect(1)
            .mount(&server)
            .await;

        let commit = client(&server)
            .fetch_commit("https://github.com/org/repo", "abcdef1", Some("secret"))
            .await
            .unwrap();

        assert_eq!(commit.hash(), "abcdef1");
        assert_eq!(commit.message(), "Add login page");
        assert_eq!(commit.author(), Some("alice"));
        assert_eq!(commit.date(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(commit.source(), CommitSource::GitHub);
        assert!(commit.diff().contains("File: src/login.rs (added)\n@@ -0,0 +1 @@"));
        assert!(commit.diff().contains("File: logo.png (modified)\n[Binary or Large File]"));
    }

    #[tokio::test]
    async fn test_fetch_commit_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/commits/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(commit_body()))
            .mount(&server)
            .await;

        let commit = client(&server)
            .fetch_commit("https://github.com/org/repo", "abc", None)
            .await
            .unwrap();
        assert_eq!(commit.hash(), "abcdef1");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_fetch_commit_surfaces_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/commits/nope"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "message": "No commit found for SHA: nope" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_commit("https://github.com/org/repo", "nope", None)
            .await
            .unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status.as_u16(), 422);
                assert_eq!(message, "No commit found for SHA: nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_commit_bad_token_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/commits/abc"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_commit("https://github.com/org/repo", "abc", Some("stale"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unauthorized(ref m) if m == "Bad credentials"));
    }

    #[tokio::test]
    async fn test_fetch_commit_malformed_body_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/commits/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_commit("https://github.com/org/repo", "abc", None)
            .await
            .unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, StatusCode::OK);
                assert!(message.starts_with("malformed response body"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_commit_invalid_url_makes_no_request() {
        let server = MockServer::start().await;
        let err = client(&server)
            .fetch_commit("https://gitlab.com/org/repo", "abc", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidUrl(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
