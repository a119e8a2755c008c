//! Runtime configuration
//!
//! Built once by the binaries (after `.env` is loaded) and handed to the
//! components that need it.

use crate::error::BudgetError;
use crate::Result;
use std::env;

pub const DEFAULT_WATSONX_URL: &str = "https://us-south.ml.cloud.ibm.com";
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";
pub const DEFAULT_MODEL_ID: &str = "ibm/granite-3-3-8b-instruct";
pub const DEFAULT_PORT: u16 = 3001;

/// Sampling parameters sent with every completion
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 300,
            temperature: 0.4,
            top_p: 0.9,
        }
    }
}

/// watsonx.ai connection settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub project_id: String,
    pub base_url: String,
    pub iam_url: String,
    pub model_id: String,
    pub params: GenerationParams,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            base_url: DEFAULT_WATSONX_URL.to_string(),
            iam_url: DEFAULT_IAM_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            params: GenerationParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub llm: LlmConfig,
    pub port: u16,
    /// Number of recent messages sent along with each turn
    pub history_window: usize,
}

impl AgentConfig {
    pub fn new(llm: LlmConfig) -> Self {
        Self {
            llm,
            port: DEFAULT_PORT,
            history_window: 12,
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| BudgetError::ConfigError(format!("{} is not set", key)))
        };

        let mut llm = LlmConfig::new(required("WATSONX_API_KEY")?, required("WATSONX_PROJECT_ID")?);

        if let Some(url) = lookup("WATSONX_URL") {
            llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("WATSONX_IAM_URL") {
            llm.iam_url = url;
        }
        if let Some(model_id) = lookup("WATSONX_MODEL_ID") {
            llm.model_id = model_id;
        }

        let mut config = Self::new(llm);

        if let Some(port) = lookup("PORT").or_else(|| lookup("API_PORT")) {
            config.port = port
                .parse()
                .map_err(|_| BudgetError::ConfigError(format!("invalid port: {}", port)))?;
        }

        Ok(config)
    }
}
