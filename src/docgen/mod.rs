pub mod gemini;
pub mod prompt;

pub use gemini::GeminiGenerator;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info_span, warn, Instrument};

use crate::commit::Commit;

/// Low temperature keeps the output factual and close to the diffs.
pub const TEMPERATURE: f32 = 0.2;

/// Returned when the model answers without any text.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "No documentation was generated.";

pub const SYSTEM_INSTRUCTION: &str = "You are a senior technical writer embedded in a software team. \
You read commit messages and code diffs and turn them into clear, accurate, well-structured Markdown \
documentation for developers. You only describe behavior that the provided changes support.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No API key configured for the text-generation service (set GEMINI_API_KEY or [llm] api_key)")]
    MissingApiKey,

    #[error("Text-generation service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Text-generation request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// User-supplied context for one generation call. Built fresh each time.
#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub extra_info: String,
    pub setup_instructions: String,
    pub previous_doc_content: Option<String>,
}

/// One single-turn request to a text-generation model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_instruction: String,
    pub temperature: f32,
}

/// A text-generation backend. One request in, one response out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Returns the generated text, or None when the model produced none.
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, GenerationError>;
}

/// Generate Markdown documentation for `commits`.
///
/// Callers must not pass an empty slice. This never fails outward: a
/// failed generation comes back as a Markdown document explaining the
/// failure, so there is always something to render.
pub async fn generate_documentation(
    commits: &[Commit],
    config: &GenerationConfig,
    generator: &dyn TextGenerator,
) -> String {
    debug_assert!(!commits.is_empty(), "generation requires at least one commit");

    let request = GenerationRequest {
        prompt: prompt::build_prompt(commits, config),
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        temperature: TEMPERATURE,
    };
    debug!(
        commits = commits.len(),
        prompt_chars = request.prompt.len(),
        update = config.previous_doc_content.is_some(),
        "built generation prompt"
    );

    let span = info_span!("generate", model = %generator.model());
    match generator.generate(&request).instrument(span).await {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("text-generation response carried no text");
            EMPTY_RESPONSE_PLACEHOLDER.to_string()
        }
        Err(err) => {
            warn!(error = %err, "documentation generation failed");
            error_document(&err.to_string())
        }
    }
}

fn error_document(message: &str) -> String {
    format!(
        "# Generation Failed\n\n\
         The documentation could not be generated.\n\n\
         **Error:** {}\n\n\
         Check the API key, the model name, and your quota, then try again.\n",
        message
    )
}
