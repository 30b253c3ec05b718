//! Async LLM client for the externally-queried planner
//!
//! Model-agnostic HTTP client supporting Anthropic and OpenAI-compatible
//! APIs. The planner serializes the sensing snapshot into the prompt and
//! parses the reply against a strict command schema; this module only
//! moves text.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{CrisisError, Result};

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Provider selection: the mock provider exists so episodes run without
/// credentials; it always answers with the fallback sentinel.
pub enum ProviderClient {
    Mock,
    Remote(LlmClient),
}

impl ProviderClient {
    /// Resolve a CLI provider name. Anything other than "mock" needs
    /// LLM_API_KEY in the environment.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "mock" => Ok(ProviderClient::Mock),
            "anthropic" | "openai" => Ok(ProviderClient::Remote(LlmClient::from_env(name)?)),
            other => Err(CrisisError::ProviderError(format!(
                "unknown provider '{other}'"
            ))),
        }
    }

    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        match self {
            // the mock reply fails the command schema on purpose, which
            // routes the tick to the heuristic fallback
            ProviderClient::Mock => Ok(r#"{"commands": "USE_FALLBACK_HEURISTIC"}"#.into()),
            ProviderClient::Remote(client) => client.complete(system, user).await,
        }
    }
}

/// Async HTTP client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Create a new LLM client with explicit configuration
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
        }
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // OpenAI, Groq, DeepSeek and other compatible APIs
            ApiFormat::OpenAI
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults per provider), LLM_MODEL
    pub fn from_env(provider: &str) -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| CrisisError::ProviderError("LLM_API_KEY not set".into()))?;
        let default_url = match provider {
            "anthropic" => "https://api.anthropic.com/v1/messages",
            _ => "https://api.openai.com/v1/chat/completions",
        };
        let api_url = std::env::var("LLM_API_URL").unwrap_or_else(|_| default_url.into());
        let default_model = match provider {
            "anthropic" => "claude-3-haiku-20240307",
            _ => "gpt-4o-mini",
        };
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| default_model.into());

        Ok(Self::new(api_key, api_url, model))
    }

    /// Send a completion request to the LLM
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(system, user).await,
            ApiFormat::OpenAI => self.complete_openai(system, user).await,
        }
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CrisisError::ProviderError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CrisisError::ProviderError(format!("API error: {}", error_text)));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| CrisisError::ProviderError(e.to_string()))?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| CrisisError::ProviderError("Empty response".into()))
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CrisisError::ProviderError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CrisisError::ProviderError(format!("API error: {}", error_text)));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| CrisisError::ProviderError(e.to_string()))?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| CrisisError::ProviderError("Empty response".into()))
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = LlmClient::new(
            "test-key".into(),
            "https://api.example.com".into(),
            "test-model".into(),
        );
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.api_format, ApiFormat::OpenAI);

        let client = LlmClient::new(
            "test-key".into(),
            "https://api.anthropic.com/v1/messages".into(),
            "test-model".into(),
        );
        assert_eq!(client.api_format, ApiFormat::Anthropic);
    }

    #[test]
    fn unknown_provider_rejected() {
        assert!(ProviderClient::from_name("carrier-pigeon").is_err());
    }

    #[tokio::test]
    async fn mock_provider_answers_sentinel() {
        let provider = ProviderClient::Mock;
        let text = provider.complete("system", "user").await.unwrap();
        assert!(text.contains("USE_FALLBACK_HEURISTIC"));
    }
}
