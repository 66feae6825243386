//! graphrag-llm - LLM provider implementations for graphrag.
//!
//! This crate provides the completion providers used by the graphrag
//! pipeline for extraction and summarization.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - GPT-4.1, GPT-4o, etc.
//! - **Azure OpenAI** (feature: `azure`) - OpenAI models behind an Azure deployment
//! - **Gemini** (feature: `gemini`) - Google Gemini models
//!
//! # Example
//!
//! ```ignore
//! use graphrag_llm::LlmFactory;
//!
//! // Create an OpenAI LLM
//! let llm = LlmFactory::openai()?;
//!
//! // Or with a specific model
//! let llm = LlmFactory::openai_with_model("gpt-4.1")?;
//!
//! // Create a Gemini LLM
//! let llm = LlmFactory::gemini_with_model("gemini-2.0-flash")?;
//! ```

mod azure;
mod factory;
#[cfg(feature = "gemini")]
mod gemini;
mod openai;

pub use azure::AzureOpenAIProvider;
pub use factory::LlmFactory;
#[cfg(feature = "gemini")]
pub use gemini::GeminiLlm;
pub use openai::OpenAIProvider;

// Re-export core types for convenience
pub use graphrag_core::config::LlmProvider;
pub use graphrag_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
