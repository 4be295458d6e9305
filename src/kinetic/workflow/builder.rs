// SPDX-License-Identifier: MIT

//! Graph builder - assemble a workflow graph in code
//!
//! Workflow modules use this instead of writing a YAML definition:
//!
//! ```
//! use graphflow_rs::kinetic::workflow::builder::GraphBuilder;
//! use graphflow_rs::kinetic::workflow::condition::CompareOp;
//! use graphflow_rs::kinetic::workflow::graph::END;
//! use serde_json::json;
//!
//! let graph = GraphBuilder::new("retry")
//!     .node("attempt", "call_service")
//!     .conditional_edge("attempt", "ok", CompareOp::Eq, json!(true), END, "attempt")
//!     .start("attempt")
//!     .build()
//!     .unwrap();
//! assert_eq!(graph.nodes().len(), 1);
//! ```

use serde_json::Value;

use crate::adk::error::GraphError;
use crate::kinetic::workflow::condition::CompareOp;
use crate::kinetic::workflow::graph::{ConditionalEdge, Edge, Graph, GraphDefinition, Node};

/// Fluent builder for `Graph`
pub struct GraphBuilder {
    def: GraphDefinition,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: GraphDefinition {
                graph_id: None,
                name: name.into(),
                description: None,
                nodes: Vec::new(),
                edges: Vec::new(),
                start_node: String::new(),
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.def.description = Some(description.into());
        self
    }

    /// Add a node. The first node added becomes the start node unless
    /// `start` says otherwise.
    pub fn node(self, name: impl Into<String>, function_name: impl Into<String>) -> Self {
        self.push_node(Node::new(name, function_name))
    }

    pub fn node_with_description(
        self,
        name: impl Into<String>,
        function_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut node = Node::new(name, function_name);
        node.description = Some(description.into());
        self.push_node(node)
    }

    /// Plain edge `from -> to`
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let to: String = to.into();
        self.def.edges.push(Edge::new(from, to));
        self
    }

    /// Branch: go to `true_node` when `state[key] op value`, else `false_node`
    pub fn conditional_edge(
        mut self,
        from: impl Into<String>,
        key: impl Into<String>,
        op: CompareOp,
        value: Value,
        true_node: impl Into<String>,
        false_node: impl Into<String>,
    ) -> Self {
        self.def.edges.push(Edge::new(
            from,
            ConditionalEdge {
                condition_key: key.into(),
                condition_operator: op,
                condition_value: value,
                true_node: true_node.into(),
                false_node: false_node.into(),
            },
        ));
        self
    }

    pub fn start(mut self, start_node: impl Into<String>) -> Self {
        self.def.start_node = start_node.into();
        self
    }

    pub fn build(self) -> Result<Graph, GraphError> {
        Graph::new(self.def)
    }

    fn push_node(mut self, node: Node) -> Self {
        if self.def.start_node.is_empty() {
            self.def.start_node = node.name.clone();
        }
        self.def.nodes.push(node);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinetic::workflow::graph::{EdgeTarget, END};
    use serde_json::json;

    #[test]
    fn test_first_node_is_default_start() {
        let graph = GraphBuilder::new("g")
            .node("a", "fa")
            .node("b", "fb")
            .edge("a", "b")
            .build()
            .unwrap();

        assert_eq!(graph.start_node(), "a");
        assert_eq!(graph.get_next_node("a"), Some(&EdgeTarget::Node("b".to_string())));
    }

    #[test]
    fn test_explicit_start_and_description() {
        let graph = GraphBuilder::new("g")
            .description("two steps")
            .node_with_description("a", "fa", "first")
            .node("b", "fb")
            .start("b")
            .build()
            .unwrap();

        assert_eq!(graph.start_node(), "b");
        assert_eq!(graph.description(), Some("two steps"));
        assert_eq!(graph.get_node("a").unwrap().description.as_deref(), Some("first"));
    }

    #[test]
    fn test_conditional_edge() {
        let graph = GraphBuilder::new("g")
            .node("score", "calc")
            .conditional_edge("score", "quality", CompareOp::Lt, json!(7.0), "score", END)
            .build()
            .unwrap();

        match graph.get_next_node("score") {
            Some(EdgeTarget::Conditional(edge)) => {
                assert_eq!(edge.condition_operator, CompareOp::Lt);
                assert_eq!(edge.false_node, END);
            }
            other => panic!("Expected conditional edge, got {:?}", other),
        }
    }

    #[test]
    fn test_build_rejects_fan_out() {
        let result = GraphBuilder::new("g")
            .node("a", "fa")
            .edge("a", "b")
            .edge("a", "c")
            .build();

        assert_eq!(result, Err(GraphError::MultipleOutgoingEdges("a".to_string())));
    }
}
