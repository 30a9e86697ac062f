pub mod azure;
pub mod github;
pub mod url;

pub use azure::{AzureClient, Repository};
pub use github::GitHubClient;

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

const USER_AGENT: &str = concat!("commitdoc/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Provider returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err)
        } else {
            ProviderError::Network(err)
        }
    }
}

/// Build the shared HTTP client with a bounded per-request timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Pull the provider's own error message out of a failed response body.
/// GitHub and Azure DevOps both report it as a top-level `message` field.
fn provider_message(status: StatusCode, body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {}", status))
}

/// Consume a non-success response into an `Api` error.
async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Api {
        status,
        message: provider_message(status, &body),
    }
}

/// Decode a successful response body. A body that is not the expected
/// JSON is the provider's fault, so it becomes `Api` rather than `Network`.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    response.json::<T>().await.map_err(|err| {
        if err.is_decode() {
            ProviderError::Api {
                status,
                message: format!("malformed response body: {}", err),
            }
        } else {
            ProviderError::from(err)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_from_body() {
        let msg = provider_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":"No commit found for SHA: abc"}"#);
        assert_eq!(msg, "No commit found for SHA: abc");
    }

    #[test]
    fn test_provider_message_fallback() {
        let msg = provider_message(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(msg.contains("502"));

        let empty = provider_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":""}"#);
        assert!(empty.contains("500"));
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Api {
            status: StatusCode::NOT_FOUND,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Provider returned 404 Not Found: Not Found");
        assert_eq!(
            ProviderError::MissingCredential("Azure DevOps personal access token").to_string(),
            "Missing credential: Azure DevOps personal access token"
        );
    }
}
