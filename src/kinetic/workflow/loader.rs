//! Graph loader - YAML/JSON file loading and parsing
//!
//! This module handles loading graph definitions from files. JSON is a
//! subset of YAML, so both go through the YAML parser unless the caller
//! asks for strict JSON.

use super::graph::Graph;
use crate::adk::error::FlowError;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Loads graph definitions from YAML or JSON files
pub struct GraphLoader;

impl GraphLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a graph definition from a file
    pub fn load_graph<P: AsRef<Path>>(&self, path: P) -> Result<Graph, FlowError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let graph = if path.extension().is_some_and(|ext| ext == "json") {
            Self::parse_json(&content)?
        } else {
            Self::parse_yaml(&content)?
        };
        log::info!("Loaded graph '{}' from {}", graph.name(), path.display());
        Ok(graph)
    }

    /// Parse a graph definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Graph, FlowError> {
        let graph: Graph = serde_yaml::from_str(content)?;
        Self::warn_dangling(&graph);
        Ok(graph)
    }

    /// Parse a graph definition from a JSON string
    pub fn parse_json(content: &str) -> Result<Graph, FlowError> {
        let graph: Graph = serde_json::from_str(content)?;
        Self::warn_dangling(&graph);
        Ok(graph)
    }

    /// Load an initial state object from a YAML or JSON file
    pub fn load_state<P: AsRef<Path>>(&self, path: P) -> Result<Value, FlowError> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_yaml::from_str(&content)?;
        Ok(value)
    }

    fn warn_dangling(graph: &Graph) {
        for name in graph.dangling_references() {
            log::warn!(
                "Graph '{}' references node '{}' which is not defined",
                graph.name(),
                name
            );
        }
    }
}

impl Default for GraphLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinetic::workflow::condition::CompareOp;
    use crate::kinetic::workflow::graph::EdgeTarget;
    use serde_json::json;

    #[test]
    fn test_parse_linear_graph() {
        let yaml = r#"
name: Linear
description: "Three steps"
start_node: a
nodes:
  - name: a
    function_name: step_a
  - name: b
    function_name: step_b
  - name: c
    function_name: step_c
edges:
  - from_node: a
    to_node: b
  - from_node: b
    to_node: c
"#;
        let graph = GraphLoader::parse_yaml(yaml).unwrap();
        assert_eq!(graph.name(), "Linear");
        assert_eq!(graph.description(), Some("Three steps"));
        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.start_node(), "a");
        assert!(graph.get_next_node("c").is_none());
    }

    #[test]
    fn test_parse_conditional_edge() {
        let yaml = r#"
name: Loop
start_node: score
nodes:
  - name: score
    function_name: calculate_quality_score
edges:
  - from_node: score
    to_node:
      condition_key: quality_score
      condition_operator: "<"
      condition_value: 7.0
      true_node: score
      false_node: END
"#;
        let graph = GraphLoader::parse_yaml(yaml).unwrap();
        match graph.get_next_node("score") {
            Some(EdgeTarget::Conditional(edge)) => {
                assert_eq!(edge.condition_key, "quality_score");
                assert_eq!(edge.condition_operator, CompareOp::Lt);
                assert_eq!(edge.condition_value, json!(7.0));
                assert_eq!(edge.true_node, "score");
                assert_eq!(edge.false_node, "END");
            }
            other => panic!("Expected conditional edge, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "name": "Json",
            "start_node": "a",
            "nodes": [{"name": "a", "function_name": "f"}],
            "edges": []
        }"#;
        let graph = GraphLoader::parse_json(json).unwrap();
        assert_eq!(graph.name(), "Json");

        // JSON also parses as YAML
        let graph = GraphLoader::parse_yaml(json).unwrap();
        assert_eq!(graph.start_node(), "a");
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let yaml = r#"
name: Bad
start_node: a
nodes:
  - name: a
    function_name: f
edges:
  - from_node: a
    to_node:
      condition_key: x
      condition_operator: "<>"
      condition_value: 1
      true_node: a
      false_node: END
"#;
        let err = GraphLoader::parse_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Unknown operator: <>"));
    }

    #[test]
    fn test_missing_required_field() {
        let yaml = r#"
name: NoStart
nodes: []
"#;
        assert!(matches!(
            GraphLoader::parse_yaml(yaml),
            Err(FlowError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_graph_from_file() {
        let dir = std::env::temp_dir().join(format!("graphflow-loader-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("graph.json");
        fs::write(
            &path,
            r#"{"name": "File", "start_node": "a", "nodes": [{"name": "a", "function_name": "f"}]}"#,
        )
        .unwrap();

        let graph = GraphLoader::new().load_graph(&path).unwrap();
        assert_eq!(graph.name(), "File");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let result = GraphLoader::new().load_graph("/definitely/not/here.yaml");
        assert!(matches!(result, Err(FlowError::Io(_))));
    }
}
