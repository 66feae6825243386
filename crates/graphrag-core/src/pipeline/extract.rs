//! Extraction engine: text chunks in, merged graph mutations out.
//!
//! Per-text completion calls run with bounded concurrency; the merge step
//! runs single-threaded after all completions return, so the merge buffers
//! never see concurrent access. Store writes are batched UNWIND + MERGE
//! statements, atomic per row.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::{ExtractionConfig, TypeConflictPolicy};
use crate::error::{ErrorCode, GraphRagError, GraphRagResult};
use crate::traits::{GraphStore, Llm, QueryParams};
use crate::types::{ExtractionOutput, ExtractionReport, Message};

use super::merge::MergeState;
use super::parser::parse_extraction_output;
use super::prompts;

const IMPORT_ENTITIES_QUERY: &str = r#"
UNWIND $entities AS row
MERGE (e:__Entity__ {name: row.name})
ON CREATE SET e.entity_type = row.entity_type
SET e.descriptions = coalesce(e.descriptions, []) + row.descriptions
"#;

const IMPORT_RELATIONSHIPS_QUERY: &str = r#"
UNWIND $relationships AS row
MERGE (s:__Entity__ {name: row.source})
MERGE (t:__Entity__ {name: row.target})
MERGE (s)-[r:RELATED {rel_type: row.rel_type}]->(t)
SET r.descriptions = coalesce(r.descriptions, []) + row.descriptions,
    r.weight = coalesce(row.weight, r.weight)
"#;

/// Extraction engine - turns raw texts into deduplicated graph mutations.
pub struct ExtractionEngine {
    llm: Arc<dyn Llm>,
    store: Arc<dyn GraphStore>,
    config: ExtractionConfig,
}

impl ExtractionEngine {
    /// Create a new extraction engine.
    pub fn new(llm: Arc<dyn Llm>, store: Arc<dyn GraphStore>, config: ExtractionConfig) -> Self {
        Self { llm, store, config }
    }

    /// Extract entities and relationships from the given texts and upsert
    /// them into the graph store.
    ///
    /// Safe to call repeatedly: both the in-memory merge and the store
    /// writes are keyed, so re-extraction merges evidence instead of
    /// duplicating records.
    pub async fn extract(
        &self,
        texts: &[String],
        allowed_entity_types: &[String],
    ) -> GraphRagResult<ExtractionReport> {
        if texts.is_empty() {
            return Err(GraphRagError::validation_with_code(
                "texts must not be empty",
                ErrorCode::ValEmptyTexts,
            ));
        }
        if allowed_entity_types.is_empty() {
            return Err(GraphRagError::validation_with_code(
                "allowed_entity_types must not be empty",
                ErrorCode::ValEmptyEntityTypes,
            ));
        }

        // Fan out completion calls with bounded concurrency, then restore
        // input order so the merge sees texts first-seen order.
        let concurrency = self.config.max_concurrency.max(1);
        let mut completions: Vec<(usize, GraphRagResult<ExtractionOutput>)> =
            stream::iter(texts.iter().enumerate())
                .map(|(idx, text)| {
                    let llm = self.llm.clone();
                    let types = allowed_entity_types.to_vec();
                    async move { (idx, extract_one(llm.as_ref(), &types, text).await) }
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        completions.sort_by_key(|(idx, _)| *idx);

        // Single-threaded merge over the per-text outputs.
        let mut state = MergeState::new();
        let mut texts_processed = 0;
        let mut texts_skipped = 0;
        for (idx, result) in completions {
            match result {
                Ok(output) if output.is_empty() => {
                    warn!(text_index = idx, "skipping text, completion yielded no records");
                    texts_skipped += 1;
                }
                Ok(output) => {
                    state.absorb(output);
                    texts_processed += 1;
                }
                Err(e) => {
                    warn!(text_index = idx, error = %e, "skipping text after failed completion");
                    texts_skipped += 1;
                }
            }
        }

        if self.config.type_conflict_policy == TypeConflictPolicy::Reconcile {
            self.reconcile_types(&mut state).await;
        }

        let (entities, relationships) = state.into_parts();
        debug!(
            entities = entities.len(),
            relationships = relationships.len(),
            "writing merged extraction output"
        );

        if !entities.is_empty() {
            let mut params: QueryParams = HashMap::new();
            params.insert("entities".to_string(), serde_json::to_value(&entities)?);
            self.store.run(IMPORT_ENTITIES_QUERY, params).await?;
        }
        if !relationships.is_empty() {
            let mut params: QueryParams = HashMap::new();
            params.insert(
                "relationships".to_string(),
                serde_json::to_value(&relationships)?,
            );
            self.store.run(IMPORT_RELATIONSHIPS_QUERY, params).await?;
        }

        Ok(ExtractionReport {
            entities,
            relationships,
            texts_processed,
            texts_skipped,
        })
    }

    /// Resolve entity type conflicts with one follow-up completion each.
    /// A failed or unrecognized answer keeps the first-seen type.
    async fn reconcile_types(&self, state: &mut MergeState) {
        for (name, candidates) in state.type_conflicts() {
            let messages = vec![
                Message::system(prompts::system_prompt()),
                Message::user(prompts::type_reconciliation_prompt(&name, &candidates)),
            ];
            match self.llm.generate(&messages, None).await {
                Ok(response) => {
                    let answer = response.content_or_empty().trim();
                    let resolved = candidates
                        .iter()
                        .find(|c| c.eq_ignore_ascii_case(answer))
                        .cloned();
                    match resolved {
                        Some(entity_type) => state.set_entity_type(&name, entity_type),
                        None => warn!(
                            entity = %name,
                            answer = %answer,
                            "type reconciliation returned an unknown type, keeping first-seen"
                        ),
                    }
                }
                Err(e) => {
                    warn!(entity = %name, error = %e, "type reconciliation failed, keeping first-seen")
                }
            }
        }
    }
}

/// Run one completion call for one text and parse the delimited output.
async fn extract_one(
    llm: &dyn Llm,
    allowed_entity_types: &[String],
    text: &str,
) -> GraphRagResult<ExtractionOutput> {
    let messages = vec![
        Message::system(prompts::system_prompt()),
        Message::user(prompts::graph_extraction_prompt(allowed_entity_types, text)),
    ];

    let response = llm.generate(&messages, None).await?;
    Ok(parse_extraction_output(response.content_or_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{RecordingStore, ScriptedLlm};

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn allowed() -> Vec<String> {
        texts(&["Person", "Organization", "Location"])
    }

    fn scenario_llm() -> Arc<ScriptedLlm> {
        Arc::new(ScriptedLlm::new(vec![
            (
                "Tomaz works for Neo4j".to_string(),
                concat!(
                    r#"("entity"<|>Tomaz<|>Person<|>Tomaz works for Neo4j)##"#,
                    "\n",
                    r#"("entity"<|>Neo4j<|>Organization<|>A graph database company)##"#,
                    "\n",
                    r#"("relationship"<|>Tomaz<|>Neo4j<|>WORKS_FOR<|>Tomaz is employed by Neo4j<|>9)<|COMPLETE|>"#
                )
                .to_string(),
            ),
            (
                "Tomaz lives in Grosuplje".to_string(),
                concat!(
                    r#"("entity"<|>Tomaz<|>Person<|>Tomaz lives in Grosuplje)##"#,
                    "\n",
                    r#"("entity"<|>Grosuplje<|>Location<|>A town in Slovenia)##"#,
                    "\n",
                    r#"("relationship"<|>Tomaz<|>Grosuplje<|>LIVES_IN<|>Tomaz resides in Grosuplje<|>8)<|COMPLETE|>"#
                )
                .to_string(),
            ),
        ]))
    }

    #[tokio::test]
    async fn test_extract_merges_across_texts() {
        let store = Arc::new(RecordingStore::new());
        let engine = ExtractionEngine::new(
            scenario_llm(),
            store.clone(),
            ExtractionConfig::default(),
        );

        let report = engine
            .extract(
                &texts(&["Tomaz works for Neo4j", "Tomaz lives in Grosuplje"]),
                &allowed(),
            )
            .await
            .unwrap();

        assert_eq!(report.texts_processed, 2);
        assert_eq!(report.texts_skipped, 0);
        assert_eq!(report.entity_count(), 3);
        assert_eq!(report.relationship_count(), 2);

        // Tomaz appears once with both descriptions merged in order.
        let tomaz = report.entities.iter().find(|e| e.name == "Tomaz").unwrap();
        assert_eq!(
            tomaz.descriptions,
            vec!["Tomaz works for Neo4j", "Tomaz lives in Grosuplje"]
        );

        let rel_types: Vec<&str> = report
            .relationships
            .iter()
            .map(|r| r.rel_type.as_str())
            .collect();
        assert_eq!(rel_types, vec!["WORKS_FOR", "LIVES_IN"]);

        // Both batched upserts hit the store.
        let queries = store.queries();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].0.contains("MERGE (e:__Entity__ {name: row.name})"));
        assert!(queries[1].0.contains("MERGE (s)-[r:RELATED {rel_type: row.rel_type}]->(t)"));
    }

    #[tokio::test]
    async fn test_extract_twice_yields_same_key_sets() {
        let store = Arc::new(RecordingStore::new());
        let engine = ExtractionEngine::new(
            scenario_llm(),
            store,
            ExtractionConfig::default(),
        );
        let input = texts(&["Tomaz works for Neo4j", "Tomaz lives in Grosuplje"]);

        let first = engine.extract(&input, &allowed()).await.unwrap();
        let second = engine.extract(&input, &allowed()).await.unwrap();

        let names = |r: &ExtractionReport| {
            r.entities.iter().map(|e| e.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second));
        assert_eq!(first.relationship_count(), second.relationship_count());
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected() {
        let engine = ExtractionEngine::new(
            scenario_llm(),
            Arc::new(RecordingStore::new()),
            ExtractionConfig::default(),
        );

        let err = engine.extract(&[], &allowed()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValEmptyTexts);

        let err = engine
            .extract(&texts(&["some text"]), &[])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValEmptyEntityTypes);
    }

    #[tokio::test]
    async fn test_failed_completion_skips_text_not_batch() {
        let llm = Arc::new(
            ScriptedLlm::new(vec![(
                "Tomaz works for Neo4j".to_string(),
                r#"("entity"<|>Tomaz<|>Person<|>desc)<|COMPLETE|>"#.to_string(),
            )])
            .fail_on("broken text"),
        );
        let store = Arc::new(RecordingStore::new());
        let engine = ExtractionEngine::new(llm, store, ExtractionConfig::default());

        let report = engine
            .extract(&texts(&["broken text", "Tomaz works for Neo4j"]), &allowed())
            .await
            .unwrap();

        assert_eq!(report.texts_processed, 1);
        assert_eq!(report.texts_skipped, 1);
        assert_eq!(report.entity_count(), 1);
    }

    #[tokio::test]
    async fn test_recordless_completion_counts_as_skipped() {
        // One text parses; the other two come back empty or entirely
        // malformed, yielding no records, and are skipped rather than
        // silently counted as processed.
        let llm = Arc::new(ScriptedLlm::new(vec![
            (
                "Tomaz works for Neo4j".to_string(),
                r#"("entity"<|>Tomaz<|>Person<|>desc)<|COMPLETE|>"#.to_string(),
            ),
            (
                "weather report".to_string(),
                "I could not find any entities.<|COMPLETE|>".to_string(),
            ),
            // "unmatched text" falls through to the empty default completion.
        ]));
        let store = Arc::new(RecordingStore::new());
        let engine = ExtractionEngine::new(llm, store, ExtractionConfig::default());

        let report = engine
            .extract(
                &texts(&["Tomaz works for Neo4j", "weather report", "unmatched text"]),
                &allowed(),
            )
            .await
            .unwrap();

        assert_eq!(report.texts_processed, 1);
        assert_eq!(report.texts_skipped, 2);
        assert_eq!(report.entity_count(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_policy_resolves_conflict() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            (
                "chunk one".to_string(),
                r#"("entity"<|>Neo4j<|>Organization<|>a company)<|COMPLETE|>"#.to_string(),
            ),
            (
                "chunk two".to_string(),
                r#"("entity"<|>Neo4j<|>Product<|>a database)<|COMPLETE|>"#.to_string(),
            ),
            // Reconciliation follow-up.
            ("conflicting types".to_string(), "Product".to_string()),
        ]));
        let store = Arc::new(RecordingStore::new());
        let config = ExtractionConfig {
            type_conflict_policy: TypeConflictPolicy::Reconcile,
            ..Default::default()
        };
        let engine = ExtractionEngine::new(llm, store, config);

        let report = engine
            .extract(&texts(&["chunk one", "chunk two"]), &allowed())
            .await
            .unwrap();

        assert_eq!(report.entities[0].entity_type, "Product");
    }
}
