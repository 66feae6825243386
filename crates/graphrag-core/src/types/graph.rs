//! Graph-facing types: extracted records, merged entities/relationships,
//! community clusters, and per-engine reports.

use serde::{Deserialize, Serialize};

/// An entity record parsed from a single LLM completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// The entity name as emitted by the model.
    pub name: String,
    /// The entity type, expected to come from the caller-supplied set.
    pub entity_type: String,
    /// Description of this mention.
    pub description: String,
}

/// A relationship record parsed from a single LLM completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    /// The source entity name.
    pub source: String,
    /// The target entity name.
    pub target: String,
    /// The relationship type (free text, normalized at merge time).
    pub rel_type: String,
    /// Evidence text for this mention.
    pub description: String,
    /// LLM-estimated relationship strength (1-10).
    pub strength: Option<f64>,
}

/// Output of parsing one completion: the records that survived validation.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutput {
    pub entities: Vec<ExtractedEntity>,
    pub relationships: Vec<ExtractedRelationship>,
}

impl ExtractionOutput {
    /// Check if the output is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

/// An entity after cross-chunk merge, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntity {
    /// First-seen display name.
    pub name: String,
    /// First-seen entity type (unless reconciled).
    pub entity_type: String,
    /// Description list in first-seen order, one per mention.
    pub descriptions: Vec<String>,
}

/// A relationship after cross-chunk merge, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRelationship {
    pub source: String,
    pub target: String,
    /// Normalized relationship type (uppercase, underscores).
    pub rel_type: String,
    /// Evidence list in first-seen order.
    pub descriptions: Vec<String>,
    /// Last-seen strength estimate.
    pub weight: Option<f64>,
}

/// A community of entities produced by the detection procedure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    /// Stable id within one run: "{level}-{community}".
    pub id: String,
    /// Hierarchy level (0 = finest).
    pub level: i64,
    /// Member entity names.
    pub members: Vec<CommunityMember>,
}

/// One entity inside a community, with whatever context the graph holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityMember {
    pub name: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

/// Result of one extraction call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Entities written to the store after merge.
    pub entities: Vec<MergedEntity>,
    /// Relationships written to the store after merge.
    pub relationships: Vec<MergedRelationship>,
    /// Number of input texts successfully processed.
    pub texts_processed: usize,
    /// Number of input texts skipped (failed completion or unparseable).
    pub texts_skipped: usize,
}

impl ExtractionReport {
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}

/// Result of one summarization call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Entities that received a summary.
    pub nodes_summarized: usize,
    /// Relationships that received a summary.
    pub relationships_summarized: usize,
    /// Items skipped after a failed or empty completion.
    pub skipped: usize,
}

/// Result of one community summarization call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CommunityReport {
    /// Communities returned by the detection procedure.
    pub communities_detected: usize,
    /// Communities that received a summary.
    pub communities_summarized: usize,
    /// Communities below the minimum size, or with failed completions.
    pub skipped: usize,
}
