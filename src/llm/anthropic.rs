//! Anthropic Claude Messages API client.

use async_trait::async_trait;
use serde_json::Value;

use super::{LlmClient, LlmError, MessagesRequest, MessagesResponse};
use crate::config::Config;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    beta: Option<String>,
}

impl AnthropicClient {
    /// Build a client whose every call is bounded by `config.request_timeout`.
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            beta: config.beta.clone(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse, LlmError> {
        let mut builder = self
            .http
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        if let Some(beta) = &self.beta {
            builder = builder.header("anthropic-beta", beta);
        }

        let response = builder.json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        MessagesResponse::from_value(body)
    }
}
