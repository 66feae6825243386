//! Google Gemini LLM provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use graphrag_core::error::{GraphRagError, GraphRagResult};
use graphrag_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use graphrag_core::types::{Message, MessageRole};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Google Gemini LLM provider.
pub struct GeminiLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiLlm {
    /// Create a new Gemini LLM provider.
    pub fn new(config: LlmConfig) -> GraphRagResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                GraphRagError::Configuration(
                    "Google API key not found. Set GOOGLE_API_KEY environment variable or provide api_key in config.".to_string(),
                )
            })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            api_key
                .parse()
                .map_err(|_| GraphRagError::Configuration("Invalid API key format".to_string()))?,
        );
        headers.insert(
            "content-type",
            "application/json"
                .parse()
                .map_err(|_| GraphRagError::Configuration("Invalid content type".to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                GraphRagError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_API_URL.to_string());

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Map the conversation to Gemini's content format.
    ///
    /// Gemini has no system role: system content is prepended to the first
    /// user message. Assistant turns map to the "model" role.
    fn to_gemini_contents(messages: &[Message]) -> Vec<GeminiContent> {
        let system_text: Vec<&str> = messages
            .iter()
            .filter(|m| matches!(m.role, MessageRole::System))
            .map(|m| m.content.as_str())
            .collect();
        let mut system_prefix = if system_text.is_empty() {
            None
        } else {
            Some(system_text.join("\n"))
        };

        messages
            .iter()
            .filter(|m| !matches!(m.role, MessageRole::System))
            .map(|m| {
                let role = match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                };
                let text = if role == "user" {
                    match system_prefix.take() {
                        Some(prefix) => format!("{}\n\n{}", prefix, m.content),
                        None => m.content.clone(),
                    }
                } else {
                    m.content.clone()
                };
                GeminiContent {
                    role: role.to_string(),
                    parts: vec![GeminiPart { text }],
                }
            })
            .collect()
    }
}

#[async_trait]
impl Llm for GeminiLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> GraphRagResult<LlmResponse> {
        let options = options.unwrap_or_default();
        let model = options.model.unwrap_or_else(|| self.config.model.clone());

        let request = GeminiRequest {
            contents: Self::to_gemini_contents(messages),
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature.unwrap_or(self.config.temperature),
                max_output_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            },
        };

        debug!(model = %model, "sending Gemini generateContent request");
        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, model
            ))
            .json(&request)
            .send()
            .await
            .map_err(|e| GraphRagError::llm(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GraphRagError::llm(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let error: Result<GeminiError, _> = serde_json::from_str(&body);
            let message = error
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.clone());
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(GraphRagError::rate_limit(format!(
                    "Gemini API rate limited: {}",
                    message
                )));
            }
            return Err(GraphRagError::llm(format!(
                "Gemini API error ({}): {}",
                status, message
            )));
        }

        let response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| GraphRagError::llm(format!("Failed to parse response: {}", e)))?;

        let content = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.clone());

        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(LlmResponse { content, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_prepended_to_first_user_turn() {
        let messages = vec![
            Message::system("You are terse."),
            Message::user("Hello"),
            Message::assistant("Hi"),
            Message::user("Bye"),
        ];
        let contents = GeminiLlm::to_gemini_contents(&messages);

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[0].parts[0].text, "You are terse.\n\nHello");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[1].parts[0].text, "Hi");
        assert_eq!(contents[2].parts[0].text, "Bye");
    }

    #[test]
    fn test_no_system_message_passes_through() {
        let messages = vec![Message::user("Hello")];
        let contents = GeminiLlm::to_gemini_contents(&messages);
        assert_eq!(contents[0].parts[0].text, "Hello");
    }

    #[test]
    fn test_missing_api_key_fails_at_construction() {
        if std::env::var("GOOGLE_API_KEY").is_err() {
            assert!(matches!(
                GeminiLlm::new(LlmConfig::default()),
                Err(GraphRagError::Configuration(_))
            ));
        }
    }
}
