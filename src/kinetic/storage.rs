// SPDX-License-Identifier: MIT

//! In-memory storage for graphs and finished runs
//!
//! Entries live for the lifetime of the process. Ids are random UUIDs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adk::error::FlowError;
use crate::kinetic::workflow::graph::{ExecutionLogEntry, ExecutionResult, Graph, RunStatus};
use crate::kinetic::workflow::state::WorkflowState;

/// A finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub graph_id: String,
    pub final_state: WorkflowState,
    pub execution_log: Vec<ExecutionLogEntry>,
    pub status: RunStatus,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl RunRecord {
    pub fn new(graph_id: impl Into<String>, result: ExecutionResult) -> Self {
        let status = result.status();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            graph_id: graph_id.into(),
            final_state: result.final_state,
            execution_log: result.execution_log,
            status,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Thread-safe store; clones share the same maps
#[derive(Clone, Default)]
pub struct InMemoryStore {
    graphs: Arc<RwLock<HashMap<String, Arc<Graph>>>>,
    runs: Arc<RwLock<HashMap<String, Arc<RunRecord>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a graph, assigning an id if it has none. Returns the id.
    pub async fn save_graph(&self, mut graph: Graph) -> String {
        let graph_id = match graph.graph_id() {
            Some(id) => id.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                graph.set_graph_id(id.clone());
                id
            }
        };

        let mut graphs = self.graphs.write().await;
        graphs.insert(graph_id.clone(), Arc::new(graph));
        graph_id
    }

    pub async fn get_graph(&self, graph_id: &str) -> Result<Arc<Graph>, FlowError> {
        let graphs = self.graphs.read().await;
        graphs
            .get(graph_id)
            .cloned()
            .ok_or_else(|| FlowError::not_found("Graph", graph_id))
    }

    pub async fn save_run(&self, run: RunRecord) -> Arc<RunRecord> {
        let run = Arc::new(run);
        let mut runs = self.runs.write().await;
        runs.insert(run.run_id.clone(), run.clone());
        run
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Arc<RunRecord>, FlowError> {
        let runs = self.runs.read().await;
        runs.get(run_id)
            .cloned()
            .ok_or_else(|| FlowError::not_found("Run", run_id))
    }

    /// Stored graph ids, sorted
    pub async fn list_graphs(&self) -> Vec<String> {
        let graphs = self.graphs.read().await;
        let mut ids: Vec<String> = graphs.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stored run ids, sorted
    pub async fn list_runs(&self) -> Vec<String> {
        let runs = self.runs.read().await;
        let mut ids: Vec<String> = runs.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinetic::workflow::builder::GraphBuilder;

    fn sample_graph() -> Graph {
        GraphBuilder::new("sample").node("a", "f").build().unwrap()
    }

    fn empty_result() -> ExecutionResult {
        ExecutionResult {
            final_state: WorkflowState::empty(),
            execution_log: vec![],
        }
    }

    #[tokio::test]
    async fn test_save_graph_assigns_id() {
        let store = InMemoryStore::new();
        let id = store.save_graph(sample_graph()).await;

        let graph = store.get_graph(&id).await.unwrap();
        assert_eq!(graph.graph_id(), Some(id.as_str()));
        assert_eq!(graph.name(), "sample");
    }

    #[tokio::test]
    async fn test_save_graph_keeps_existing_id() {
        let store = InMemoryStore::new();
        let mut graph = sample_graph();
        graph.set_graph_id("fixed");

        assert_eq!(store.save_graph(graph).await, "fixed");
        assert_eq!(store.list_graphs().await, vec!["fixed"]);
    }

    #[tokio::test]
    async fn test_get_missing_graph() {
        let store = InMemoryStore::new();
        let err = store.get_graph("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Graph 'nope' not found");
    }

    #[tokio::test]
    async fn test_runs() {
        let store = InMemoryStore::new();
        let run = store.save_run(RunRecord::new("g", empty_result())).await;

        let fetched = store.get_run(&run.run_id).await.unwrap();
        assert_eq!(fetched.graph_id, "g");
        assert_eq!(fetched.status, RunStatus::Completed);
        assert_eq!(store.list_runs().await, vec![run.run_id.clone()]);
        assert!(store.get_run("other").await.is_err());
    }

    #[tokio::test]
    async fn test_store_is_clone() {
        let store = InMemoryStore::new();
        let cloned = store.clone();

        let id = cloned.save_graph(sample_graph()).await;
        assert!(store.get_graph(&id).await.is_ok());
    }
}
