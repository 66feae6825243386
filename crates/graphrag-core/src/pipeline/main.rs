//! The `GraphRag` facade: one handle over the extraction, summarization
//! and community engines, sharing a single LLM and graph store.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::GraphRagConfig;
use crate::error::GraphRagResult;
use crate::traits::{GraphStore, Llm};
use crate::types::{CommunityReport, ExtractionReport, SummaryReport};

use super::community::CommunityEngine;
use super::extract::ExtractionEngine;
use super::summarize::SummarizationEngine;

const ENTITY_NAME_CONSTRAINT: &str = r#"
CREATE CONSTRAINT entity_name IF NOT EXISTS
FOR (e:__Entity__) REQUIRE e.name IS UNIQUE
"#;

const COMMUNITY_ID_CONSTRAINT: &str = r#"
CREATE CONSTRAINT community_id IF NOT EXISTS
FOR (c:__Community__) REQUIRE c.id IS UNIQUE
"#;

/// Entry point for the GraphRAG pipeline.
///
/// Wraps an [`Llm`] and a [`GraphStore`] and exposes the three pipeline
/// stages plus `close`. Schema constraints are created lazily before the
/// first write.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use graphrag_core::{GraphRag, GraphRagConfig};
/// # async fn run(llm: Arc<dyn graphrag_core::Llm>, store: Arc<dyn graphrag_core::GraphStore>) -> graphrag_core::GraphRagResult<()> {
/// let rag = GraphRag::new(llm, store, GraphRagConfig::default());
/// let texts = vec!["Tomaz works for Neo4j.".to_string()];
/// let types = vec!["Person".to_string(), "Organization".to_string()];
/// rag.extract_nodes_and_rels(&texts, &types).await?;
/// rag.summarize_nodes_and_rels().await?;
/// rag.summarize_communities().await?;
/// rag.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct GraphRag {
    llm: Arc<dyn Llm>,
    store: Arc<dyn GraphStore>,
    config: GraphRagConfig,
    schema: OnceCell<()>,
}

impl GraphRag {
    /// Create a new pipeline over the given LLM and graph store.
    pub fn new(llm: Arc<dyn Llm>, store: Arc<dyn GraphStore>, config: GraphRagConfig) -> Self {
        Self {
            llm,
            store,
            config,
            schema: OnceCell::new(),
        }
    }

    /// Extract entities and relationships from `texts` and upsert them
    /// into the graph.
    pub async fn extract_nodes_and_rels(
        &self,
        texts: &[String],
        allowed_entity_types: &[String],
    ) -> GraphRagResult<ExtractionReport> {
        self.ensure_schema().await?;
        let engine = ExtractionEngine::new(
            self.llm.clone(),
            self.store.clone(),
            self.config.extraction.clone(),
        );
        let report = engine.extract(texts, allowed_entity_types).await?;
        info!(
            entities = report.entity_count(),
            relationships = report.relationship_count(),
            texts_processed = report.texts_processed,
            texts_skipped = report.texts_skipped,
            "extraction complete"
        );
        Ok(report)
    }

    /// Summarize every entity and relationship that has accumulated
    /// descriptions but no summary yet.
    pub async fn summarize_nodes_and_rels(&self) -> GraphRagResult<SummaryReport> {
        self.ensure_schema().await?;
        let engine = SummarizationEngine::new(
            self.llm.clone(),
            self.store.clone(),
            self.config.summarization.clone(),
        );
        let report = engine.summarize().await?;
        info!(
            nodes = report.nodes_summarized,
            relationships = report.relationships_summarized,
            skipped = report.skipped,
            "summarization complete"
        );
        Ok(report)
    }

    /// Detect entity communities and write a summary for each.
    pub async fn summarize_communities(&self) -> GraphRagResult<CommunityReport> {
        self.ensure_schema().await?;
        let engine = CommunityEngine::new(
            self.llm.clone(),
            self.store.clone(),
            self.config.community.clone(),
        );
        let report = engine.summarize_communities().await?;
        info!(
            detected = report.communities_detected,
            summarized = report.communities_summarized,
            skipped = report.skipped,
            "community summarization complete"
        );
        Ok(report)
    }

    /// Close the underlying graph store connection.
    pub async fn close(&self) -> GraphRagResult<()> {
        self.store.close().await
    }

    async fn ensure_schema(&self) -> GraphRagResult<()> {
        self.schema
            .get_or_try_init(|| async {
                self.store
                    .run(ENTITY_NAME_CONSTRAINT, Default::default())
                    .await?;
                self.store
                    .run(COMMUNITY_ID_CONSTRAINT, Default::default())
                    .await?;
                Ok(())
            })
            .await
            .map(|_| ())
    }
}
