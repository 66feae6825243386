//! Factory for creating LLM providers.

use std::sync::Arc;

use graphrag_core::config::LlmProvider;
use graphrag_core::error::{GraphRagError, GraphRagResult};
use graphrag_core::traits::{Llm, LlmConfig};

use crate::azure::AzureOpenAIProvider;
#[cfg(feature = "gemini")]
use crate::gemini::GeminiLlm;
use crate::openai::OpenAIProvider;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> GraphRagResult<Arc<dyn Llm>> {
        match provider {
            LlmProvider::OpenAI => {
                let llm = OpenAIProvider::new(config)?;
                Ok(Arc::new(llm))
            }
            LlmProvider::AzureOpenAI => {
                let llm = AzureOpenAIProvider::new(config)?;
                Ok(Arc::new(llm))
            }
            #[cfg(feature = "gemini")]
            LlmProvider::Gemini => {
                let llm = GeminiLlm::new(config)?;
                Ok(Arc::new(llm))
            }
            #[allow(unreachable_patterns)]
            other => Err(GraphRagError::UnsupportedProvider {
                provider: format!("{other:?}"),
            }),
        }
    }

    /// Create an OpenAI LLM provider with default configuration.
    pub fn openai() -> GraphRagResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::OpenAI, LlmConfig::default())
    }

    /// Create an OpenAI LLM provider with a specific model.
    pub fn openai_with_model(model: impl Into<String>) -> GraphRagResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::OpenAI, config)
    }

    /// Create an Azure OpenAI LLM provider for the given deployment.
    pub fn azure_with_deployment(deployment: impl Into<String>) -> GraphRagResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: deployment.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::AzureOpenAI, config)
    }

    /// Create a Gemini LLM provider with default configuration.
    #[cfg(feature = "gemini")]
    pub fn gemini() -> GraphRagResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::Gemini, LlmConfig::default())
    }

    /// Create a Gemini LLM provider with a specific model.
    #[cfg(feature = "gemini")]
    pub fn gemini_with_model(model: impl Into<String>) -> GraphRagResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Gemini, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_with_explicit_keys() {
        let config = LlmConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let llm = LlmFactory::create(LlmProvider::OpenAI, config.clone()).unwrap();
        assert!(!llm.model_name().is_empty());

        #[cfg(feature = "gemini")]
        {
            let llm = LlmFactory::create(LlmProvider::Gemini, config).unwrap();
            assert!(!llm.model_name().is_empty());
        }
    }

    #[cfg(not(feature = "gemini"))]
    #[test]
    fn test_disabled_provider_rejected() {
        let config = LlmConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let err = match LlmFactory::create(LlmProvider::Gemini, config) {
            Err(e) => e,
            Ok(_) => panic!("expected error"),
        };
        assert!(matches!(
            err,
            GraphRagError::UnsupportedProvider { .. }
        ));
    }
}
