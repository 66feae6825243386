//! graphrag-graph-stores - Graph store implementations for graphrag.
//!
//! This crate provides the graph database backends the pipeline writes
//! entities, relationships, and communities to.
//!
//! # Supported Backends
//!
//! - **Neo4j** (feature: `neo4j`) - Neo4j graph database
//! - **Memgraph** (feature: `memgraph`) - Memgraph (bolt-compatible)
//!
//! Community detection requires the Graph Data Science plugin on the
//! Neo4j side; the stores themselves make no assumptions about installed
//! procedures.

mod factory;

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
mod bolt;

#[cfg(feature = "neo4j")]
mod neo4j;

#[cfg(feature = "memgraph")]
mod memgraph;

pub use factory::GraphStoreFactory;

#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jStore;

#[cfg(feature = "memgraph")]
pub use memgraph::MemgraphStore;

// Re-export core types
pub use graphrag_core::traits::{GraphStore, GraphStoreConfig, GraphStoreProvider};
