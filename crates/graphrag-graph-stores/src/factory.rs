//! Factory for creating graph store providers.

use std::sync::Arc;

use graphrag_core::error::{GraphRagError, GraphRagResult};
use graphrag_core::traits::{GraphStore, GraphStoreConfig, GraphStoreProvider};

/// Factory for creating graph store providers.
pub struct GraphStoreFactory;

impl GraphStoreFactory {
    /// Create a graph store from the given configuration.
    pub async fn create(
        provider: GraphStoreProvider,
        config: GraphStoreConfig,
    ) -> GraphRagResult<Arc<dyn GraphStore>> {
        match provider {
            #[cfg(feature = "neo4j")]
            GraphStoreProvider::Neo4j => {
                let store = crate::neo4j::Neo4jStore::new(config).await?;
                Ok(Arc::new(store))
            }

            #[cfg(feature = "memgraph")]
            GraphStoreProvider::Memgraph => {
                let store = crate::memgraph::MemgraphStore::new(config).await?;
                Ok(Arc::new(store))
            }

            #[allow(unreachable_patterns)]
            _ => Err(GraphRagError::UnsupportedProvider {
                provider: format!("{:?}", provider),
            }),
        }
    }

    /// Create a Neo4j graph store for the given connection parameters.
    #[cfg(feature = "neo4j")]
    pub async fn neo4j(
        uri: &str,
        username: &str,
        password: &str,
    ) -> GraphRagResult<Arc<dyn GraphStore>> {
        let config = GraphStoreConfig {
            provider: GraphStoreProvider::Neo4j,
            url: uri.to_string(),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            database: None,
        };
        Self::create(GraphStoreProvider::Neo4j, config).await
    }

    /// Create a graph store from environment variables
    /// (`NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`).
    #[cfg(feature = "neo4j")]
    pub async fn neo4j_from_env() -> GraphRagResult<Arc<dyn GraphStore>> {
        let uri = std::env::var("NEO4J_URI").map_err(|_| {
            GraphRagError::Configuration(
                "Neo4j URI not found. Set NEO4J_URI environment variable.".to_string(),
            )
        })?;
        let username = std::env::var("NEO4J_USERNAME").map_err(|_| {
            GraphRagError::Configuration(
                "Neo4j username not found. Set NEO4J_USERNAME environment variable.".to_string(),
            )
        })?;
        let password = std::env::var("NEO4J_PASSWORD").map_err(|_| {
            GraphRagError::Configuration(
                "Neo4j password not found. Set NEO4J_PASSWORD environment variable.".to_string(),
            )
        })?;
        Self::neo4j(&uri, &username, &password).await
    }
}
