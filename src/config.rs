use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::provider::github::DEFAULT_API_URL;

pub const CONFIG_FILE: &str = ".commitdoc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .commitdoc.toml.
/// All sections are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub azure: AzureConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,

    #[serde(default = "default_github_api_url")]
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_api_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AzureConfig {
    /// Personal access token. If None, falls back to AZURE_DEVOPS_PAT env var.
    pub token: Option<String>,

    /// Send every organization-level request here instead of the
    /// dev.azure.com / visualstudio.com endpoint (Azure DevOps Server, proxies).
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// If None, falls back to GEMINI_API_KEY env var.
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_github_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from .commitdoc.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Config file value takes precedence, falls back to GITHUB_TOKEN.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    /// Config file value takes precedence, falls back to AZURE_DEVOPS_PAT.
    pub fn azure_token(&self) -> Option<String> {
        self.azure
            .token
            .clone()
            .or_else(|| std::env::var("AZURE_DEVOPS_PAT").ok())
    }

    /// Config file value takes precedence, falls back to GEMINI_API_KEY.
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }
}
