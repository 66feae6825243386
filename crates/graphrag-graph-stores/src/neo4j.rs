//! Neo4j graph store implementation.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph};
use tracing::debug;

use graphrag_core::error::{GraphRagError, GraphRagResult};
use graphrag_core::traits::{GraphStore, GraphStoreConfig, QueryParams, Row};

use crate::bolt::{fetch_query, run_query};

/// Neo4j graph store implementation.
pub struct Neo4jStore {
    graph: Graph,
    #[allow(dead_code)]
    config: GraphStoreConfig,
}

impl Neo4jStore {
    /// Create a new Neo4j store and open the connection.
    pub async fn new(config: GraphStoreConfig) -> GraphRagResult<Self> {
        let username = config.username.clone().unwrap_or_else(|| "neo4j".to_string());
        let password = config.password.clone().unwrap_or_default();

        let mut builder = ConfigBuilder::default()
            .uri(&config.url)
            .user(&username)
            .password(&password);
        if let Some(ref database) = config.database {
            builder = builder.db(database.as_str());
        }
        let neo4j_config = builder.build().map_err(|e| {
            GraphRagError::Configuration(format!("Invalid Neo4j configuration: {}", e))
        })?;

        debug!(url = %config.url, "connecting to Neo4j");
        let graph = Graph::connect(neo4j_config).await.map_err(|e| {
            GraphRagError::graph_connection(format!("Failed to connect to Neo4j: {}", e))
        })?;

        Ok(Self { graph, config })
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn run(&self, query: &str, params: QueryParams) -> GraphRagResult<()> {
        run_query(&self.graph, query, params).await
    }

    async fn fetch(&self, query: &str, params: QueryParams) -> GraphRagResult<Vec<Row>> {
        fetch_query(&self.graph, query, params).await
    }

    async fn close(&self) -> GraphRagResult<()> {
        // neo4rs connections are pooled and dropped with the Graph handle.
        Ok(())
    }
}
