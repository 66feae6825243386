//! Community engine: partitions entities with a graph-side community
//! detection procedure and summarizes each detected cluster.
//!
//! Communities are fully derived state: every run clears the previous
//! `__Community__` nodes, re-runs detection, and writes fresh records.
//! Identity is not stable across runs.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::CommunityConfig;
use crate::error::GraphRagResult;
use crate::traits::{GraphStore, Llm, QueryParams};
use crate::types::{Community, CommunityMember, CommunityReport, Message};

use super::prompts;
use super::rows::{get_i64, get_str};

const COUNT_ENTITIES_QUERY: &str = r#"
MATCH (e:__Entity__)
RETURN count(e) AS count
"#;

const PROJECTION_NAME: &str = "graphrag_communities";

const PROJECT_GRAPH_QUERY: &str = r#"
CALL gds.graph.project('graphrag_communities', '__Entity__', {
  RELATED: {type: 'RELATED', orientation: 'UNDIRECTED'}
})
"#;

const LEIDEN_WRITE_QUERY: &str = r#"
CALL gds.leiden.write('graphrag_communities', {
  writeProperty: 'communities',
  includeIntermediateCommunities: true
})
"#;

const DROP_PROJECTION_QUERY: &str = r#"
CALL gds.graph.drop('graphrag_communities', false)
"#;

const CLEAR_COMMUNITIES_QUERY: &str = r#"
MATCH (c:__Community__)
DETACH DELETE c
"#;

const GATHER_COMMUNITIES_QUERY: &str = r#"
MATCH (e:__Entity__)
WHERE e.communities IS NOT NULL
UNWIND range(0, size(e.communities) - 1) AS level
WITH level, e.communities[level] AS community,
     collect({name: e.name, entity_type: e.entity_type, summary: e.summary, descriptions: e.descriptions}) AS members
RETURN level, community, members
ORDER BY level, community
"#;

const MEMBER_RELS_QUERY: &str = r#"
MATCH (s:__Entity__)-[r:RELATED]->(t:__Entity__)
WHERE s.name IN $members AND t.name IN $members AND r.summary IS NOT NULL
RETURN s.name AS source, t.name AS target, r.rel_type AS rel_type, r.summary AS summary
"#;

const WRITE_COMMUNITY_QUERY: &str = r#"
MERGE (c:__Community__ {id: $id})
SET c.level = $level, c.summary = $summary
WITH c
MATCH (e:__Entity__)
WHERE e.name IN $members
MERGE (e)-[:IN_COMMUNITY]->(c)
"#;

/// Community detection and summarization engine.
pub struct CommunityEngine {
    llm: Arc<dyn Llm>,
    store: Arc<dyn GraphStore>,
    config: CommunityConfig,
}

impl CommunityEngine {
    /// Create a new community engine.
    pub fn new(llm: Arc<dyn Llm>, store: Arc<dyn GraphStore>, config: CommunityConfig) -> Self {
        Self { llm, store, config }
    }

    /// Detect communities and summarize each one.
    ///
    /// An empty graph short-circuits to zero counts without invoking the
    /// detection procedure.
    pub async fn summarize_communities(&self) -> GraphRagResult<CommunityReport> {
        let rows = self.store.fetch(COUNT_ENTITIES_QUERY, HashMap::new()).await?;
        let entity_count = rows.first().and_then(|r| get_i64(r, "count")).unwrap_or(0);
        if entity_count == 0 {
            debug!("graph is empty, skipping community detection");
            return Ok(CommunityReport::default());
        }

        self.run_detection().await?;
        self.store.run(CLEAR_COMMUNITIES_QUERY, HashMap::new()).await?;

        let mut communities = self.gather_communities().await?;
        if let Some(max_levels) = self.config.max_levels {
            communities.retain(|c| (c.level as usize) < max_levels);
        }
        let mut report = CommunityReport {
            communities_detected: communities.len(),
            ..Default::default()
        };

        let (eligible, small): (Vec<_>, Vec<_>) = communities
            .into_iter()
            .partition(|c| c.members.len() >= self.config.min_community_size);
        report.skipped += small.len();
        for community in &small {
            debug!(
                id = %community.id,
                size = community.members.len(),
                "community below minimum size, skipping"
            );
        }

        let concurrency = self.config.max_concurrency.max(1);
        let results: Vec<bool> = stream::iter(eligible.iter())
            .map(|community| self.summarize_one(community))
            .buffer_unordered(concurrency)
            .collect()
            .await;
        for ok in results {
            if ok {
                report.communities_summarized += 1;
            } else {
                report.skipped += 1;
            }
        }

        Ok(report)
    }

    /// Project the entity graph, run Leiden, drop the projection.
    async fn run_detection(&self) -> GraphRagResult<()> {
        // Drop any projection left over from an interrupted run.
        if let Err(e) = self.store.run(DROP_PROJECTION_QUERY, HashMap::new()).await {
            debug!(error = %e, projection = PROJECTION_NAME, "no stale projection to drop");
        }

        self.store.run(PROJECT_GRAPH_QUERY, HashMap::new()).await?;
        let result = self.store.run(LEIDEN_WRITE_QUERY, HashMap::new()).await;

        if let Err(e) = self.store.run(DROP_PROJECTION_QUERY, HashMap::new()).await {
            warn!(error = %e, projection = PROJECTION_NAME, "failed to drop graph projection");
        }

        result
    }

    /// Read the per-(level, community) membership written by detection.
    async fn gather_communities(&self) -> GraphRagResult<Vec<Community>> {
        let rows = self
            .store
            .fetch(GATHER_COMMUNITIES_QUERY, HashMap::new())
            .await?;

        let mut communities = Vec::new();
        for row in rows {
            let (Some(level), Some(community)) = (get_i64(&row, "level"), get_i64(&row, "community"))
            else {
                warn!("skipping malformed community row");
                continue;
            };
            let members: Vec<CommunityMember> = row
                .get("members")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();

            communities.push(Community {
                id: format!("{}-{}", level, community),
                level,
                members,
            });
        }

        Ok(communities)
    }

    /// Summarize one community and write the result. Returns false on a
    /// failed or empty completion.
    async fn summarize_one(&self, community: &Community) -> bool {
        let member_names: Vec<String> =
            community.members.iter().map(|m| m.name.clone()).collect();

        let member_lines: Vec<String> = community
            .members
            .iter()
            .map(|m| {
                let entity_type = m.entity_type.as_deref().unwrap_or("unknown");
                let context = m
                    .summary
                    .clone()
                    .unwrap_or_else(|| m.descriptions.join("; "));
                format!("- {} ({}): {}", m.name, entity_type, context)
            })
            .collect();

        let rel_lines = match self.member_relationships(&member_names).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(id = %community.id, error = %e, "failed to fetch member relationships");
                Vec::new()
            }
        };

        let messages = vec![
            Message::system(prompts::system_prompt()),
            Message::user(prompts::community_summary_prompt(&member_lines, &rel_lines)),
        ];
        let summary = match self.llm.generate(&messages, None).await {
            Ok(response) => response.content_or_empty().trim().to_string(),
            Err(e) => {
                warn!(id = %community.id, error = %e, "community summarization failed, skipping");
                return false;
            }
        };
        if summary.is_empty() {
            warn!(id = %community.id, "empty community summary, skipping");
            return false;
        }

        let mut params: QueryParams = HashMap::new();
        params.insert("id".to_string(), json!(community.id));
        params.insert("level".to_string(), json!(community.level));
        params.insert("summary".to_string(), json!(summary));
        params.insert("members".to_string(), json!(member_names));

        match self.store.run(WRITE_COMMUNITY_QUERY, params).await {
            Ok(()) => true,
            Err(e) => {
                warn!(id = %community.id, error = %e, "failed to write community, skipping");
                false
            }
        }
    }

    /// Summarized relationships among the given members, rendered for the
    /// community prompt.
    async fn member_relationships(&self, members: &[String]) -> GraphRagResult<Vec<String>> {
        let mut params: QueryParams = HashMap::new();
        params.insert("members".to_string(), json!(members));

        let rows = self.store.fetch(MEMBER_RELS_QUERY, params).await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let source = get_str(row, "source")?;
                let target = get_str(row, "target")?;
                let rel_type = get_str(row, "rel_type")?;
                let summary = get_str(row, "summary")?;
                Some(format!("- ({})-[{}]->({}): {}", source, rel_type, target, summary))
            })
            .collect())
    }
}
