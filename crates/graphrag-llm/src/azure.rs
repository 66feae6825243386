//! Azure OpenAI LLM provider implementation.
//!
//! Uses the same chat completion surface as the OpenAI provider but
//! authenticates against an Azure deployment. The configured model name
//! doubles as the deployment id.

use async_trait::async_trait;

use graphrag_core::error::{GraphRagError, GraphRagResult};
use graphrag_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use graphrag_core::types::Message;

#[cfg(feature = "azure")]
use async_openai::{
    config::AzureConfig,
    types::{ChatCompletionRequestMessage, CreateChatCompletionRequest},
    Client,
};

#[cfg(feature = "azure")]
use crate::openai::OpenAIProvider;

const DEFAULT_API_VERSION: &str = "2024-08-01-preview";

/// Azure OpenAI LLM provider.
pub struct AzureOpenAIProvider {
    #[cfg(feature = "azure")]
    client: Client<AzureConfig>,
    config: LlmConfig,
}

impl AzureOpenAIProvider {
    /// Create a new Azure OpenAI LLM provider.
    ///
    /// Requires an API key (`AZURE_OPENAI_API_KEY`) and an endpoint
    /// (`AZURE_OPENAI_ENDPOINT`); the API version falls back to
    /// `OPENAI_API_VERSION` and then to a pinned default.
    pub fn new(config: LlmConfig) -> GraphRagResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("AZURE_OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                GraphRagError::Configuration(
                    "Azure OpenAI API key not found. Set AZURE_OPENAI_API_KEY environment variable or provide api_key in config.".to_string(),
                )
            })?;

        let endpoint = config
            .base_url
            .clone()
            .or_else(|| std::env::var("AZURE_OPENAI_ENDPOINT").ok())
            .ok_or_else(|| {
                GraphRagError::Configuration(
                    "Azure OpenAI endpoint not found. Set AZURE_OPENAI_ENDPOINT environment variable or provide base_url in config.".to_string(),
                )
            })?;

        let api_version = config
            .api_version
            .clone()
            .or_else(|| std::env::var("OPENAI_API_VERSION").ok())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        if config.model.is_empty() {
            return Err(GraphRagError::Configuration(
                "Azure OpenAI requires a model name matching the deployment id.".to_string(),
            ));
        }

        #[cfg(feature = "azure")]
        let client = Client::with_config(
            AzureConfig::new()
                .with_api_base(endpoint)
                .with_api_key(api_key)
                .with_api_version(api_version)
                .with_deployment_id(config.model.clone()),
        );
        #[cfg(not(feature = "azure"))]
        let _ = (api_key, endpoint, api_version);

        Ok(Self {
            #[cfg(feature = "azure")]
            client,
            config,
        })
    }
}

#[async_trait]
impl Llm for AzureOpenAIProvider {
    #[cfg(feature = "azure")]
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> GraphRagResult<LlmResponse> {
        let chat_messages: Vec<ChatCompletionRequestMessage> = messages
            .iter()
            .map(OpenAIProvider::message_to_openai)
            .collect();

        let options = options.unwrap_or_default();

        let request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: chat_messages,
            temperature: Some(options.temperature.unwrap_or(self.config.temperature)),
            max_tokens: Some(options.max_tokens.unwrap_or(self.config.max_tokens)),
            ..Default::default()
        };

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| GraphRagError::llm(format!("Azure OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| GraphRagError::llm("No response choices returned"))?;

        let content = choice.message.content.clone();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse { content, usage })
    }

    #[cfg(not(feature = "azure"))]
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> GraphRagResult<LlmResponse> {
        Err(GraphRagError::Configuration(
            "Azure OpenAI feature not enabled. Enable the 'azure' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> LlmConfig {
        LlmConfig {
            model: "my-deployment".to_string(),
            api_key: Some("test-key".to_string()),
            base_url: Some("https://example.openai.azure.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_deployment_name() {
        let config = LlmConfig {
            model: String::new(),
            ..base_config()
        };
        assert!(matches!(
            AzureOpenAIProvider::new(config),
            Err(GraphRagError::Configuration(_))
        ));
    }

    #[test]
    fn test_endpoint_required() {
        let config = LlmConfig {
            base_url: None,
            ..base_config()
        };
        if std::env::var("AZURE_OPENAI_ENDPOINT").is_err() {
            assert!(matches!(
                AzureOpenAIProvider::new(config),
                Err(GraphRagError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_valid_config_constructs() {
        let provider = AzureOpenAIProvider::new(base_config()).unwrap();
        assert_eq!(provider.model_name(), "my-deployment");
    }
}
