//! Memgraph graph store implementation.
//! Memgraph is compatible with the bolt protocol, so everything but the
//! connection defaults is shared with the Neo4j store.

use async_trait::async_trait;
use neo4rs::Graph;
use tracing::debug;

use graphrag_core::error::{GraphRagError, GraphRagResult};
use graphrag_core::traits::{GraphStore, GraphStoreConfig, QueryParams, Row};

use crate::bolt::{fetch_query, run_query};

/// Memgraph graph store implementation.
pub struct MemgraphStore {
    graph: Graph,
    #[allow(dead_code)]
    config: GraphStoreConfig,
}

impl MemgraphStore {
    /// Create a new Memgraph store and open the connection.
    pub async fn new(config: GraphStoreConfig) -> GraphRagResult<Self> {
        let username = config
            .username
            .clone()
            .unwrap_or_else(|| "memgraph".to_string());
        let password = config.password.clone().unwrap_or_default();

        debug!(url = %config.url, "connecting to Memgraph");
        let graph = Graph::new(&config.url, &username, &password)
            .await
            .map_err(|e| {
                GraphRagError::graph_connection(format!("Failed to connect to Memgraph: {}", e))
            })?;

        Ok(Self { graph, config })
    }
}

#[async_trait]
impl GraphStore for MemgraphStore {
    async fn run(&self, query: &str, params: QueryParams) -> GraphRagResult<()> {
        run_query(&self.graph, query, params).await
    }

    async fn fetch(&self, query: &str, params: QueryParams) -> GraphRagResult<Vec<Row>> {
        fetch_query(&self.graph, query, params).await
    }

    async fn close(&self) -> GraphRagResult<()> {
        Ok(())
    }
}
