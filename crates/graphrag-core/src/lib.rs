//! graphrag-core - Core library for graphrag.
//!
//! This crate provides the core types, traits, and the GraphRAG pipeline:
//! entity/relationship extraction from text, node and relationship
//! summarization, and community detection with per-community summaries.
//!
//! # Example
//!
//! ```ignore
//! use graphrag_core::{GraphRag, GraphRagConfig};
//!
//! let config = GraphRagConfig::default();
//! let rag = GraphRag::new(llm, store, config);
//!
//! // Build the graph from raw texts
//! rag.extract_nodes_and_rels(&texts, &entity_types).await?;
//!
//! // Condense accumulated descriptions into summaries
//! rag.summarize_nodes_and_rels().await?;
//!
//! // Detect and summarize entity communities
//! rag.summarize_communities().await?;
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{
    CommunityConfig, ExtractionConfig, GraphRagConfig, LlmProvider, LlmProviderConfig,
    SummarizationConfig, TypeConflictPolicy,
};
pub use error::{ErrorCode, GraphRagError, GraphRagResult};
pub use pipeline::GraphRag;
pub use traits::{
    GenerationOptions, GraphStore, GraphStoreConfig, GraphStoreProvider, Llm, LlmConfig,
    LlmResponse, QueryParams, Row, TokenUsage,
};
pub use types::{
    Community, CommunityMember, CommunityReport, ExtractedEntity, ExtractedRelationship,
    ExtractionOutput, ExtractionReport, MergedEntity, MergedRelationship, Message, MessageRole,
    SummaryReport,
};
