//! OpenAI-compatible `/chat/completions` client

use super::{Completion, CompletionRequest, LlmService};
use crate::config::{timeout_secs, LlmSettings};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatChoiceMessage {
    content: String,
}

pub struct OpenAiCompatible {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatible {
    pub fn new(base_url: &str, api_key: Option<String>, model: &str) -> Result<Self> {
        Self::build(base_url, api_key, model, Duration::from_secs(30))
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Self::build(
            &settings.base_url,
            settings.api_key.clone(),
            &settings.model,
            timeout_secs(settings.timeout),
        )
    }

    fn build(base_url: &str, api_key: Option<String>, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmService for OpenAiCompatible {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let mut messages = vec![json!({"role": "system", "content": request.system_prompt})];
        for message in &request.messages {
            messages.push(serde_json::to_value(message)?);
        }

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("LLM request failed: HTTP {}", status.as_u16()));
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("LLM response had no choices"))?;

        Ok(Completion { text })
    }
}
