//! Core traits for graphrag providers.

mod graph_store;
mod llm;

pub use graph_store::{GraphStore, GraphStoreConfig, GraphStoreProvider, QueryParams, Row};
pub use llm::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
