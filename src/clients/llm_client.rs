// src/clients/llm_client.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::{
    config::LlmConfig,
    pipeline::{GenerationError, QuestionResponder},
};

/// OpenAI-compatible `chat/completions` endpoint used as a [`QuestionResponder`].
#[derive(Debug, Clone)]
pub struct ChatCompletionsResponder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl ChatCompletionsResponder {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10).min(config.timeout))
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl QuestionResponder for ChatCompletionsResponder {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        tracing::debug!(model = %self.model, chars = prompt.len(), "Sending generation request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout)
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status: status.as_u16(), body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("unreadable response body: {e}")))?;

        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or(GenerationError::EmptyContent)
    }
}
