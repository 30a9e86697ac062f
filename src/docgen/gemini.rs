use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{GenerationError, GenerationRequest, TextGenerator};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationSettings,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationSettings {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Google Gemini `generateContent` over REST.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all)]
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &request.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &request.prompt }],
            }],
            generation_config: GenerationSettings {
                temperature: request.temperature,
            },
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
        debug!("sending generateContent request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "received generateContent response");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("request failed with status {}", status));
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = response.json::<GenerateContentResponse>().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}
