use crate::api::middleware::AppError;
use crate::config::Config;
use reqwest::Client as HttpClient;
use serde_json::json;
use std::time::Duration;

/// Sends a finished prompt to a hosted language model and returns the text
/// completion
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

/// OpenAI-compatible chat completions client.
///
/// Model, temperature and timeout come from configuration; there is no retry
/// and no streaming.
pub struct LlmService {
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    http_client: HttpClient,
}

impl LlmService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            api_key: config.llm.api_key.clone(),
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn extract_content(body: &serde_json::Value) -> Result<String, AppError> {
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AppError::LlmService("LLM response does not contain a completion".to_string()))
    }
}

#[async_trait::async_trait]
impl CompletionClient for LlmService {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::LlmService("LLM API key is not configured".to_string())
        })?;

        tracing::debug!("Calling {} with a {} byte prompt", self.model, prompt.len());

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&json!({
                "model": self.model,
                "temperature": self.temperature,
                "messages": [
                    { "role": "user", "content": prompt }
                ],
            }))
            .send()
            .await
            .map_err(|e| AppError::LlmService(format!("Failed to call LLM service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::LlmService(format!(
                "LLM service returned error {}: {}",
                status, error_text
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LlmService(format!("Failed to parse LLM response: {}", e)))?;

        Self::extract_content(&body)
    }
}
