// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ollama API client for local AI inference

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{LuminaraError, Result};

/// Anything that can answer a system + user prompt with a JSON document
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Return the raw JSON text produced by the model
    async fn chat_json(&self, model: &str, system: &str, user: &str) -> Result<String>;
}

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    format: &'static str,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        // Normalize URL
        let base_url = base_url
            .trim_end_matches('/')
            .replace("/api/generate", "")
            .replace("/api/chat", "");

        Ok(Self { client, base_url, retries: 0 })
    }

    /// Build a client from the engine section of the config
    pub fn from_config(config: &crate::AppConfig) -> Result<Self> {
        let client = Self::new(
            &config.ai_engine.url,
            Duration::from_secs(config.ai_engine.timeout_secs),
        )?;
        Ok(client.with_retries(config.ai_engine.retries))
    }

    /// Retry failed chat requests this many times
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                LuminaraError::OllamaUnavailable(format!(
                    "Cannot connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        Ok(())
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client
            .get(&url)
            .send()
            .await?;

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check if a specific model is available
    pub async fn model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| {
            m.starts_with(model) || m == &format!("{}:latest", model)
        }))
    }

    /// Single chat round-trip in JSON mode
    pub async fn chat(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            format: "json",
            stream: false,
        };

        debug!("Sending chat request to Ollama: model={}", model);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LuminaraError::OllamaUnavailable(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let result: ChatResponse = response.json().await?;
        Ok(result.message.content)
    }

    /// Chat with retry logic
    pub async fn chat_with_retry(
        &self,
        model: &str,
        system: &str,
        user: &str,
        retries: u32,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                warn!("Retrying Ollama request in {:?} (attempt {})", delay, attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match self.chat(model, system, user).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LuminaraError::OllamaUnavailable("Unknown error".to_string())
        }))
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn chat_json(&self, model: &str, system: &str, user: &str) -> Result<String> {
        self.chat_with_retry(model, system, user, self.retries).await
    }
}

/// Strip a markdown code fence some models wrap around JSON output
pub fn json_payload(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OllamaClient {
        OllamaClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_normalization() {
        let client =
            OllamaClient::new("http://localhost:11434/api/chat/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");

        let client =
            OllamaClient::new("http://localhost:11434/api/generate", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_json_payload_strips_fence() {
        assert_eq!(json_payload("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(json_payload("  [1, 2] "), "[1, 2]");
    }

    #[tokio::test]
    async fn test_chat_sends_json_mode_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3.1:8b",
                "format": "json",
                "stream": false,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.1:8b",
                "message": { "role": "assistant", "content": "{\"definitions\": []}" },
                "done": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = client_for(&server)
            .chat_json("llama3.1:8b", "system", "user")
            .await
            .unwrap();
        assert_eq!(content, "{\"definitions\": []}");
    }

    #[tokio::test]
    async fn test_chat_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).chat("m", "s", "u").await.unwrap_err();
        assert!(matches!(err, LuminaraError::OllamaUnavailable(_)));
    }

    #[tokio::test]
    async fn test_chat_json_retries_after_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": "{\"concepts\": []}" },
                "done": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = client_for(&server)
            .with_retries(1)
            .chat_json("llama3.1:8b", "system", "user")
            .await
            .unwrap();
        assert_eq!(content, "{\"concepts\": []}");
    }

    #[tokio::test]
    async fn test_chat_json_gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .with_retries(1)
            .chat_json("m", "s", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, LuminaraError::OllamaUnavailable(_)));
    }

    #[tokio::test]
    async fn test_model_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "llama3.1:8b" }, { "name": "nomic-embed-text:latest" }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.model_available("llama3.1").await.unwrap());
        assert!(client.model_available("nomic-embed-text").await.unwrap());
        assert!(!client.model_available("mistral").await.unwrap());
        assert!(client.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let client =
            OllamaClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.health_check().await,
            Err(LuminaraError::OllamaUnavailable(_))
        ));
    }
}
