//! Shared types for graphrag.

mod graph;
mod message;

pub use graph::{
    Community, CommunityMember, CommunityReport, ExtractedEntity, ExtractedRelationship,
    ExtractionOutput, ExtractionReport, MergedEntity, MergedRelationship, SummaryReport,
};
pub use message::{Message, MessageRole};
