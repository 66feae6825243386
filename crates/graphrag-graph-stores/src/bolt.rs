//! Conversion between JSON parameter values and bolt types, plus shared
//! query helpers for the bolt-speaking stores.

use neo4rs::{
    query, BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltType, Graph,
};
use serde_json::Value;

use graphrag_core::error::{GraphRagError, GraphRagResult};
use graphrag_core::traits::{QueryParams, Row};

/// Convert a JSON value into the bolt representation.
///
/// Numbers without an integral representation are sent as floats.
pub fn json_to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                BoltType::Integer(BoltInteger::new(i))
            } else {
                BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(0.0)))
            }
        }
        Value::String(s) => BoltType::String(s.as_str().into()),
        Value::Array(items) => {
            let mut list = BoltList::default();
            for item in items {
                list.push(json_to_bolt(item));
            }
            BoltType::List(list)
        }
        Value::Object(map) => {
            let mut bolt_map = BoltMap::default();
            for (key, item) in map {
                bolt_map.put(key.as_str().into(), json_to_bolt(item));
            }
            BoltType::Map(bolt_map)
        }
    }
}

fn build_query(cypher: &str, params: QueryParams) -> neo4rs::Query {
    let mut q = query(cypher);
    for (key, value) in params {
        q = q.param(&key, json_to_bolt(&value));
    }
    q
}

/// Run a write query, discarding any results.
pub async fn run_query(graph: &Graph, cypher: &str, params: QueryParams) -> GraphRagResult<()> {
    graph
        .run(build_query(cypher, params))
        .await
        .map_err(|e| GraphRagError::graph_store(format!("Query failed: {}", e)))
}

/// Run a read query and collect each row as a JSON object keyed by the
/// returned column names.
pub async fn fetch_query(
    graph: &Graph,
    cypher: &str,
    params: QueryParams,
) -> GraphRagResult<Vec<Row>> {
    let mut result = graph
        .execute(build_query(cypher, params))
        .await
        .map_err(|e| GraphRagError::graph_store(format!("Query failed: {}", e)))?;

    let mut rows = Vec::new();
    while let Some(row) = result
        .next()
        .await
        .map_err(|e| GraphRagError::graph_store(format!("Failed to fetch row: {}", e)))?
    {
        let value: Row = row
            .to::<Row>()
            .map_err(|e| GraphRagError::graph_store(format!("Failed to decode row: {}", e)))?;
        rows.push(value);
    }

    Ok(rows)
}
