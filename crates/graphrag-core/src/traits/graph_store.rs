//! Graph store trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::GraphRagResult;

/// Query parameters: name to JSON value, converted by each backend to its
/// wire parameter type.
pub type QueryParams = HashMap<String, serde_json::Value>;

/// A returned row as a JSON object keyed by the RETURN aliases.
pub type Row = serde_json::Value;

/// Core GraphStore trait - all graph database backends implement this.
///
/// The pipeline expresses every mutation as an idempotent parameterized
/// MERGE statement so that concurrent callers cannot lose updates; backends
/// only need to execute statements, not understand them. The backend must
/// also support calling stored procedures (community detection).
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute a statement, discarding any results.
    async fn run(&self, query: &str, params: QueryParams) -> GraphRagResult<()>;

    /// Execute a statement and collect the returned rows.
    async fn fetch(&self, query: &str, params: QueryParams) -> GraphRagResult<Vec<Row>>;

    /// Release the underlying connection.
    async fn close(&self) -> GraphRagResult<()>;
}

/// Graph store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    /// Provider type.
    pub provider: GraphStoreProvider,
    /// Connection URL.
    pub url: String,
    /// Username for authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Database name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            provider: GraphStoreProvider::Neo4j,
            url: "bolt://localhost:7687".to_string(),
            username: None,
            password: None,
            database: None,
        }
    }
}

/// Graph store provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GraphStoreProvider {
    #[default]
    Neo4j,
    Memgraph,
}
