//! watsonx.ai chat client
//!
//! Exchanges the API key for an IAM bearer token (cached until shortly
//! before it expires) and calls the text chat endpoint.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::LlmConfig;
use crate::error::BudgetError;
use crate::llm::{ChatModel, ChatTurn};
use crate::response::ChatResponse;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
const CHAT_API_VERSION: &str = "2024-05-31";
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Reusable watsonx client (connection-pooled)
pub struct WatsonxClient {
    client: Client,
    config: LlmConfig,
    token: Mutex<Option<IamToken>>,
}

impl WatsonxClient {
    pub fn new(config: LlmConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/ml/v1/text/chat?version={}",
            self.config.base_url, CHAT_API_VERSION
        )
    }

    /// Current bearer token, fetching a new one when the cached one is stale
    async fn bearer_token(&self) -> crate::Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> crate::Result<IamToken> {
        debug!("Requesting IAM token");

        let response = self
            .client
            .post(&self.config.iam_url)
            .form(&[
                ("grant_type", IAM_GRANT_TYPE),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("IAM token request failed: {}", e);
                BudgetError::AuthError(format!("IAM token request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("IAM token error response: {} {}", status, error_text);
            return Err(BudgetError::AuthError(format!(
                "IAM token error: {} {}",
                status, error_text
            )));
        }

        let body: IamTokenResponse = response.json().await.map_err(|e| {
            BudgetError::AuthError(format!("IAM token parse error: {}", e))
        })?;

        info!("IAM token refreshed");

        Ok(IamToken::issued_now(
            body.access_token,
            body.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
        ))
    }
}

#[async_trait::async_trait]
impl ChatModel for WatsonxClient {
    fn name(&self) -> &str {
        &self.config.model_id
    }

    async fn complete(&self, turns: &[ChatTurn]) -> crate::Result<ChatResponse> {
        if self.config.api_key.is_empty() || self.config.project_id.is_empty() {
            return Err(BudgetError::ConfigError(
                "watsonx credentials not configured".to_string(),
            ));
        }

        let token = self.bearer_token().await?;
        let request = ChatRequest::new(&self.config, turns);

        info!(model = %self.config.model_id, turns = turns.len(), "Calling watsonx chat API");

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("watsonx request failed: {}", e);
                BudgetError::LlmError(format!("watsonx request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("watsonx error response: {} {}", status, error_text);
            return Err(BudgetError::LlmError(format!(
                "watsonx error: {} {}",
                status, error_text
            )));
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            error!("Failed to parse watsonx response: {}", e);
            BudgetError::LlmError(format!("watsonx parse error: {}", e))
        })?;

        if let Some(usage) = &completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "watsonx usage"
            );
        }

        first_choice(completion)
    }
}

//
// ================= IAM Token =================
//

#[derive(Debug, Clone)]
struct IamToken {
    access_token: String,
    expires_at: Instant,
}

impl IamToken {
    fn issued_now(access_token: String, expires_in_secs: u64) -> Self {
        Self {
            access_token,
            expires_at: Instant::now() + Duration::from_secs(expires_in_secs),
        }
    }

    /// Usable until one refresh margin before expiry
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

//
// ================= Chat Wire Types =================
//

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

impl<'a> ChatRequest<'a> {
    fn new(config: &'a LlmConfig, turns: &'a [ChatTurn]) -> Self {
        Self {
            model_id: &config.model_id,
            project_id: &config.project_id,
            messages: turns,
            max_tokens: config.params.max_new_tokens,
            temperature: config.params.temperature,
            top_p: config.params.top_p,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatResponse,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

fn first_choice(completion: ChatCompletion) -> crate::Result<ChatResponse> {
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| BudgetError::LlmError("No choices in watsonx response".to_string()))
}
