//! Configuration system for graphrag.

use serde::{Deserialize, Serialize};

use crate::error::{GraphRagError, GraphRagResult};
use crate::traits::{GraphStoreConfig, LlmConfig};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "open_ai", alias = "openai")]
    OpenAI,
    #[serde(rename = "azure_open_ai", alias = "azure")]
    AzureOpenAI,
    Gemini,
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            config: LlmConfig {
                model: "gpt-4.1-mini".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Policy for resolving entity type conflicts during merge.
///
/// Two mentions of the same normalized name can disagree on the entity type.
/// `KeepFirst` keeps the first-seen type; `Reconcile` issues one follow-up
/// completion per conflicted entity to pick among the observed types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeConflictPolicy {
    #[default]
    KeepFirst,
    Reconcile,
}

/// Extraction engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum concurrent completion calls per extraction call.
    pub max_concurrency: usize,
    /// How to resolve entity type conflicts on merge.
    pub type_conflict_policy: TypeConflictPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            type_conflict_policy: TypeConflictPolicy::KeepFirst,
        }
    }
}

/// Summarization engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationConfig {
    /// Items fetched and processed per batch.
    pub batch_size: usize,
    /// Maximum concurrent completion calls within a batch.
    pub max_concurrency: usize,
    /// Bounded retries for transient completion failures.
    pub max_retries: usize,
    /// Initial backoff delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            max_concurrency: 5,
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Community engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Communities with fewer members than this are skipped.
    pub min_community_size: usize,
    /// Hierarchy levels to summarize, finest first. `None` takes every
    /// level the detection procedure produced.
    pub max_levels: Option<usize>,
    /// Maximum concurrent completion calls.
    pub max_concurrency: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            min_community_size: 2,
            max_levels: None,
            max_concurrency: 5,
        }
    }
}

/// Main graphrag configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphRagConfig {
    /// LLM configuration.
    pub llm: LlmProviderConfig,
    /// Graph store configuration.
    pub graph_store: GraphStoreConfig,
    /// Extraction engine configuration.
    pub extraction: ExtractionConfig,
    /// Summarization engine configuration.
    pub summarization: SummarizationConfig,
    /// Community engine configuration.
    pub community: CommunityConfig,
}

impl GraphRagConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> GraphRagResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| GraphRagError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| GraphRagError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| GraphRagError::Configuration(e.to_string())),
            _ => Err(GraphRagError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `NEO4J_URI` / `NEO4J_USERNAME` / `NEO4J_PASSWORD` for the store,
    /// `GRAPHRAG_LLM_PROVIDER` / `GRAPHRAG_LLM_MODEL` for provider selection,
    /// and then only the selected provider's variables (`OPENAI_API_KEY`;
    /// `AZURE_OPENAI_API_KEY` / `AZURE_OPENAI_ENDPOINT` / `OPENAI_API_VERSION`;
    /// `GOOGLE_API_KEY`). Variables belonging to other providers are ignored,
    /// so an exported Azure endpoint cannot redirect an OpenAI client.
    /// Providers re-check their own variables at construction and fail fast
    /// when a required one is missing.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(uri) = std::env::var("NEO4J_URI") {
            config.graph_store.url = uri;
        }
        if let Ok(username) = std::env::var("NEO4J_USERNAME") {
            config.graph_store.username = Some(username);
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            config.graph_store.password = Some(password);
        }

        if let Ok(provider) = std::env::var("GRAPHRAG_LLM_PROVIDER") {
            match provider.as_str() {
                "openai" | "open_ai" => config.llm.provider = LlmProvider::OpenAI,
                "azure" | "azure_open_ai" => config.llm.provider = LlmProvider::AzureOpenAI,
                "gemini" => config.llm.provider = LlmProvider::Gemini,
                other => {
                    tracing::warn!(provider = %other, "unknown GRAPHRAG_LLM_PROVIDER, keeping default")
                }
            }
        }
        if let Ok(model) = std::env::var("GRAPHRAG_LLM_MODEL") {
            config.llm.config.model = model;
        }

        match config.llm.provider {
            LlmProvider::OpenAI => {
                if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
                    config.llm.config.api_key = Some(api_key);
                }
            }
            LlmProvider::AzureOpenAI => {
                if let Ok(api_key) = std::env::var("AZURE_OPENAI_API_KEY") {
                    config.llm.config.api_key = Some(api_key);
                }
                if let Ok(endpoint) = std::env::var("AZURE_OPENAI_ENDPOINT") {
                    config.llm.config.base_url = Some(endpoint);
                }
                if let Ok(version) = std::env::var("OPENAI_API_VERSION") {
                    config.llm.config.api_version = Some(version);
                }
            }
            LlmProvider::Gemini => {
                if let Ok(api_key) = std::env::var("GOOGLE_API_KEY") {
                    config.llm.config.api_key = Some(api_key);
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphRagConfig::default();
        assert_eq!(config.extraction.max_concurrency, 5);
        assert_eq!(
            config.extraction.type_conflict_policy,
            TypeConflictPolicy::KeepFirst
        );
        assert_eq!(config.summarization.batch_size, 20);
        assert_eq!(config.community.min_community_size, 2);
    }

    #[test]
    fn test_config_from_toml_str() {
        let toml_str = r#"
            [llm]
            provider = "azure_open_ai"
            model = "gpt-4.1"

            [extraction]
            max_concurrency = 2
            type_conflict_policy = "reconcile"
        "#;
        let config: GraphRagConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::AzureOpenAI);
        assert_eq!(config.llm.config.model, "gpt-4.1");
        assert_eq!(config.extraction.max_concurrency, 2);
        assert_eq!(
            config.extraction.type_conflict_policy,
            TypeConflictPolicy::Reconcile
        );
        // Unspecified sections fall back to defaults.
        assert_eq!(config.summarization.max_retries, 3);
    }

    #[test]
    fn test_from_env_ignores_other_providers_variables() {
        std::env::set_var("OPENAI_API_KEY", "sk-openai");
        std::env::set_var("AZURE_OPENAI_ENDPOINT", "https://corp.openai.azure.com");
        std::env::set_var("OPENAI_API_VERSION", "2024-08-01-preview");
        std::env::remove_var("GRAPHRAG_LLM_PROVIDER");

        // Default provider is OpenAI; the Azure endpoint and API version must
        // not leak into its client config.
        let config = GraphRagConfig::from_env();
        assert_eq!(config.llm.provider, LlmProvider::OpenAI);
        assert_eq!(config.llm.config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.llm.config.base_url, None);
        assert_eq!(config.llm.config.api_version, None);

        // Selecting Azure explicitly picks up its own variables instead.
        std::env::set_var("GRAPHRAG_LLM_PROVIDER", "azure_open_ai");
        std::env::set_var("AZURE_OPENAI_API_KEY", "azure-key");
        let config = GraphRagConfig::from_env();
        assert_eq!(config.llm.provider, LlmProvider::AzureOpenAI);
        assert_eq!(config.llm.config.api_key.as_deref(), Some("azure-key"));
        assert_eq!(
            config.llm.config.base_url.as_deref(),
            Some("https://corp.openai.azure.com")
        );
        assert_eq!(
            config.llm.config.api_version.as_deref(),
            Some("2024-08-01-preview")
        );

        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("AZURE_OPENAI_ENDPOINT");
        std::env::remove_var("OPENAI_API_VERSION");
        std::env::remove_var("AZURE_OPENAI_API_KEY");
        std::env::remove_var("GRAPHRAG_LLM_PROVIDER");
    }
}
