//! Summarization engine: fills in summaries for entities and relationships
//! that have accumulated descriptions but no summary yet.
//!
//! Each item is summarized with one completion call; transient provider
//! failures retry with bounded exponential backoff, anything else skips the
//! item and the batch continues. Write-backs are targeted MATCH + SET
//! statements keyed the same way as creation, so they are no-ops when the
//! target was deleted concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::SummarizationConfig;
use crate::error::{GraphRagError, GraphRagResult};
use crate::traits::{GraphStore, Llm, QueryParams, Row};
use crate::types::{Message, SummaryReport};

use super::prompts;
use super::rows::{get_str, get_string_list};

const UNSUMMARIZED_NODES_QUERY: &str = r#"
MATCH (e:__Entity__)
WHERE size(coalesce(e.descriptions, [])) > 0 AND e.summary IS NULL
RETURN e.name AS name, e.entity_type AS entity_type, e.descriptions AS descriptions
"#;

const UNSUMMARIZED_RELS_QUERY: &str = r#"
MATCH (s:__Entity__)-[r:RELATED]->(t:__Entity__)
WHERE size(coalesce(r.descriptions, [])) > 0 AND r.summary IS NULL
RETURN s.name AS source, t.name AS target, r.rel_type AS rel_type, r.descriptions AS descriptions
"#;

const WRITE_NODE_SUMMARY_QUERY: &str = r#"
MATCH (e:__Entity__ {name: $name})
SET e.summary = $summary
"#;

const WRITE_REL_SUMMARY_QUERY: &str = r#"
MATCH (s:__Entity__ {name: $source})-[r:RELATED {rel_type: $rel_type}]->(t:__Entity__ {name: $target})
SET r.summary = $summary
"#;

/// Summarization engine for entities and relationships.
pub struct SummarizationEngine {
    llm: Arc<dyn Llm>,
    store: Arc<dyn GraphStore>,
    config: SummarizationConfig,
}

impl SummarizationEngine {
    /// Create a new summarization engine.
    pub fn new(llm: Arc<dyn Llm>, store: Arc<dyn GraphStore>, config: SummarizationConfig) -> Self {
        Self { llm, store, config }
    }

    /// Summarize all entities and relationships that need it.
    pub async fn summarize(&self) -> GraphRagResult<SummaryReport> {
        let mut report = SummaryReport::default();

        let nodes = self.store.fetch(UNSUMMARIZED_NODES_QUERY, HashMap::new()).await?;
        debug!(count = nodes.len(), "entities pending summarization");
        let (done, skipped) = self.process_items(&nodes, Item::Node).await;
        report.nodes_summarized = done;
        report.skipped += skipped;

        let rels = self.store.fetch(UNSUMMARIZED_RELS_QUERY, HashMap::new()).await?;
        debug!(count = rels.len(), "relationships pending summarization");
        let (done, skipped) = self.process_items(&rels, Item::Relationship).await;
        report.relationships_summarized = done;
        report.skipped += skipped;

        Ok(report)
    }

    /// Process one item kind in bounded batches; returns (summarized, skipped).
    async fn process_items(&self, rows: &[Row], kind: Item) -> (usize, usize) {
        let mut summarized = 0;
        let mut skipped = 0;

        let batch_size = self.config.batch_size.max(1);
        let concurrency = self.config.max_concurrency.max(1);

        for batch in rows.chunks(batch_size) {
            let results: Vec<bool> = stream::iter(batch)
                .map(|row| self.summarize_one(row, kind))
                .buffer_unordered(concurrency)
                .collect()
                .await;
            for ok in results {
                if ok {
                    summarized += 1;
                } else {
                    skipped += 1;
                }
            }
        }

        (summarized, skipped)
    }

    /// Summarize one item and write the result back. Returns false when the
    /// item was skipped (malformed row, failed or empty completion, failed
    /// write).
    async fn summarize_one(&self, row: &Row, kind: Item) -> bool {
        let Some((label, prompt, query, mut params)) = build_request(row, kind) else {
            warn!(?kind, "skipping malformed summarization row");
            return false;
        };

        let summary = match self.generate_with_retry(&prompt).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(item = %label, error = %e, "summarization failed, skipping item");
                return false;
            }
        };
        if summary.is_empty() {
            warn!(item = %label, "empty summary completion, skipping item");
            return false;
        }

        params.insert("summary".to_string(), serde_json::Value::String(summary));
        match self.store.run(query, params).await {
            Ok(()) => true,
            Err(e) => {
                warn!(item = %label, error = %e, "failed to write summary, skipping item");
                false
            }
        }
    }

    /// One completion call with bounded exponential backoff on transient
    /// failures.
    async fn generate_with_retry(&self, prompt: &str) -> GraphRagResult<String> {
        let messages = vec![
            Message::system(prompts::system_prompt()),
            Message::user(prompt.to_string()),
        ];

        let generate = || async {
            let response = self.llm.generate(&messages, None).await?;
            Ok::<_, GraphRagError>(response.content_or_empty().trim().to_string())
        };

        generate
            .retry(
                ExponentialBuilder::default()
                    .with_max_times(self.config.max_retries)
                    .with_min_delay(Duration::from_millis(self.config.initial_delay_ms))
                    .with_max_delay(Duration::from_millis(self.config.max_delay_ms)),
            )
            .when(|e: &GraphRagError| e.is_transient())
            .notify(|err, dur| {
                warn!(error = %err, "transient completion failure, retrying in {:?}", dur);
            })
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Node,
    Relationship,
}

/// Build (log label, prompt, write query, write params) for one row.
fn build_request(row: &Row, kind: Item) -> Option<(String, String, &'static str, QueryParams)> {
    match kind {
        Item::Node => {
            let name = get_str(row, "name")?;
            let entity_type = get_str(row, "entity_type").unwrap_or_default();
            let descriptions = get_string_list(row, "descriptions");
            let prompt = prompts::entity_summary_prompt(&name, &entity_type, &descriptions);

            let mut params: QueryParams = HashMap::new();
            params.insert("name".to_string(), serde_json::Value::String(name.clone()));
            Some((name, prompt, WRITE_NODE_SUMMARY_QUERY, params))
        }
        Item::Relationship => {
            let source = get_str(row, "source")?;
            let target = get_str(row, "target")?;
            let rel_type = get_str(row, "rel_type")?;
            let descriptions = get_string_list(row, "descriptions");
            let prompt =
                prompts::relationship_summary_prompt(&source, &target, &rel_type, &descriptions);

            let label = format!("({})-[{}]->({})", source, rel_type, target);
            let mut params: QueryParams = HashMap::new();
            params.insert("source".to_string(), serde_json::Value::String(source));
            params.insert("target".to_string(), serde_json::Value::String(target));
            params.insert("rel_type".to_string(), serde_json::Value::String(rel_type));
            Some((label, prompt, WRITE_REL_SUMMARY_QUERY, params))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{RecordingStore, ScriptedLlm};
    use serde_json::json;

    fn node_row(name: &str) -> Row {
        json!({
            "name": name,
            "entity_type": "Person",
            "descriptions": ["works for Neo4j", "lives in Grosuplje"],
        })
    }

    fn rel_row() -> Row {
        json!({
            "source": "Tomaz",
            "target": "Neo4j",
            "rel_type": "WORKS_FOR",
            "descriptions": ["Tomaz is employed by Neo4j"],
        })
    }

    #[tokio::test]
    async fn test_summarize_writes_back_by_key() {
        let llm = Arc::new(ScriptedLlm::new(vec![(
            "Summary:".to_string(),
            "A concise summary.".to_string(),
        )]));
        let store = Arc::new(RecordingStore::new());
        store.script_fetch(vec![node_row("Tomaz")]);
        store.script_fetch(vec![rel_row()]);

        let engine = SummarizationEngine::new(llm, store.clone(), SummarizationConfig::default());
        let report = engine.summarize().await.unwrap();

        assert_eq!(report.nodes_summarized, 1);
        assert_eq!(report.relationships_summarized, 1);
        assert_eq!(report.skipped, 0);

        let queries = store.queries();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].0.contains("SET e.summary = $summary"));
        assert_eq!(queries[0].1["name"], json!("Tomaz"));
        assert!(queries[1].0.contains("SET r.summary = $summary"));
        assert_eq!(queries[1].1["rel_type"], json!("WORKS_FOR"));

        // Selection only picks up unsummarized items with descriptions, so a
        // second pass leaves already-written summaries untouched.
        let fetches = store.fetch_queries();
        assert_eq!(fetches.len(), 2);
        assert!(fetches[0].0.contains("e.summary IS NULL"));
        assert!(fetches[0]
            .0
            .contains("size(coalesce(e.descriptions, [])) > 0"));
        assert!(fetches[1].0.contains("r.summary IS NULL"));
        assert!(fetches[1]
            .0
            .contains("size(coalesce(r.descriptions, [])) > 0"));
    }

    #[tokio::test]
    async fn test_nothing_pending_returns_zero_counts() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let store = Arc::new(RecordingStore::new());
        // Both fetches return no rows.
        store.script_fetch(vec![]);
        store.script_fetch(vec![]);

        let engine = SummarizationEngine::new(llm, store.clone(), SummarizationConfig::default());
        let report = engine.summarize().await.unwrap();

        assert_eq!(report.nodes_summarized, 0);
        assert_eq!(report.relationships_summarized, 0);
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_empty_completion_skips_item() {
        // The scripted LLM answers only for Tomaz; Neo4j gets an empty
        // completion and is skipped without aborting the batch.
        let llm = Arc::new(ScriptedLlm::new(vec![(
            "Entity: Tomaz".to_string(),
            "Tomaz is a developer.".to_string(),
        )]));
        let store = Arc::new(RecordingStore::new());
        store.script_fetch(vec![node_row("Tomaz"), node_row("Neo4j")]);
        store.script_fetch(vec![]);

        let engine = SummarizationEngine::new(llm, store.clone(), SummarizationConfig::default());
        let report = engine.summarize().await.unwrap();

        assert_eq!(report.nodes_summarized, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_row_skipped() {
        let llm = Arc::new(ScriptedLlm::new(vec![(
            "Summary:".to_string(),
            "ok".to_string(),
        )]));
        let store = Arc::new(RecordingStore::new());
        store.script_fetch(vec![json!({"entity_type": "Person"})]); // no name
        store.script_fetch(vec![]);

        let engine = SummarizationEngine::new(llm, store, SummarizationConfig::default());
        let report = engine.summarize().await.unwrap();

        assert_eq!(report.nodes_summarized, 0);
        assert_eq!(report.skipped, 1);
    }
}
