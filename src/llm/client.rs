use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{check_reply, TextGenerator};
use crate::error::GenerationError;
use crate::utils::config::GeneratorConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
        };

        log::debug!(
            "POST {} (model {}, {} chars)",
            self.endpoint,
            self.model,
            user_content.len()
        );
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = resp.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenerationError::EmptyResponse)?;
        check_reply(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let config = GeneratorConfig {
            api_key: Some("  ".to_string()),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            ChatCompletionsClient::new(&config),
            Err(GenerationError::MissingApiKey)
        ));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = GeneratorConfig {
            api_key: Some("k".to_string()),
            base_url: "http://localhost:8080/v1/".to_string(),
            ..GeneratorConfig::default()
        };
        let client = ChatCompletionsClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_parse_reply() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let reply: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(reply.choices[0].message.content.as_deref(), Some("hello"));
    }
}
