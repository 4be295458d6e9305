//! Graph workflow type definitions
//!
//! `GraphDefinition` is the raw, deserialized shape of a workflow graph.
//! `Graph` is the validated form the engine runs: node names are unique and
//! each node has at most one outgoing edge.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::adk::error::{FlowError, GraphError};
use crate::kinetic::workflow::condition::{self, CompareOp};
use crate::kinetic::workflow::state::WorkflowState;

/// Terminal marker. Routing to it ends the run.
pub const END: &str = "END";

/// A named step in the graph
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Node {
    /// Unique identifier for this node
    pub name: String,
    /// Registry key of the step function to run
    pub function_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Node {
    pub fn new(name: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function_name: function_name.into(),
            description: None,
        }
    }
}

/// Branch point: compares one state value and picks one of two targets
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConditionalEdge {
    /// Key in state data to read (missing reads as null)
    pub condition_key: String,
    pub condition_operator: CompareOp,
    pub condition_value: Value,
    pub true_node: String,
    pub false_node: String,
}

impl ConditionalEdge {
    /// Pick the next node name for the given state
    pub fn evaluate(&self, state: &WorkflowState) -> Result<&str, FlowError> {
        let state_value = state.get(&self.condition_key).unwrap_or(&Value::Null);
        let result = condition::compare(state_value, self.condition_operator, &self.condition_value)?;

        let next: &str = if result {
            &self.true_node
        } else {
            &self.false_node
        };

        log::debug!(
            "Condition: {} {} {} = {}, next: {}",
            state_value,
            self.condition_operator,
            self.condition_value,
            result,
            next
        );

        Ok(next)
    }
}

/// Where an edge leads: a fixed node or a conditional branch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EdgeTarget {
    Node(String),
    Conditional(ConditionalEdge),
}

// Hand-written so operator errors inside a conditional edge keep their
// message instead of collapsing into serde's generic untagged error.
impl<'de> Deserialize<'de> for EdgeTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(name) => Ok(EdgeTarget::Node(name)),
            value @ Value::Object(_) => ConditionalEdge::deserialize(value)
                .map(EdgeTarget::Conditional)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "edge target must be a node name or a conditional edge, got {}",
                other
            ))),
        }
    }
}

impl From<&str> for EdgeTarget {
    fn from(name: &str) -> Self {
        EdgeTarget::Node(name.to_string())
    }
}

impl From<String> for EdgeTarget {
    fn from(name: String) -> Self {
        EdgeTarget::Node(name)
    }
}

impl From<ConditionalEdge> for EdgeTarget {
    fn from(edge: ConditionalEdge) -> Self {
        EdgeTarget::Conditional(edge)
    }
}

/// A directed edge out of `from_node`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Edge {
    pub from_node: String,
    pub to_node: EdgeTarget,
}

impl Edge {
    pub fn new(from_node: impl Into<String>, to_node: impl Into<EdgeTarget>) -> Self {
        Self {
            from_node: from_node.into(),
            to_node: to_node.into(),
        }
    }
}

/// Raw graph definition, as written in YAML/JSON or sent over HTTP
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    pub start_node: String,
}

/// A validated workflow graph. Read-only once built.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "GraphDefinition", into = "GraphDefinition")]
pub struct Graph {
    graph_id: Option<String>,
    name: String,
    description: Option<String>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    start_node: String,
}

impl Graph {
    /// Validate a definition into a graph.
    ///
    /// `start_node` and edge targets are not checked here; a missing node
    /// shows up as an error entry when a run reaches it.
    pub fn new(def: GraphDefinition) -> Result<Self, GraphError> {
        let mut names = HashSet::new();
        for node in &def.nodes {
            if !names.insert(node.name.as_str()) {
                return Err(GraphError::DuplicateNode(node.name.clone()));
            }
        }

        let mut sources = HashSet::new();
        for edge in &def.edges {
            if !sources.insert(edge.from_node.as_str()) {
                return Err(GraphError::MultipleOutgoingEdges(edge.from_node.clone()));
            }
        }

        Ok(Self {
            graph_id: def.graph_id,
            name: def.name,
            description: def.description,
            nodes: def.nodes,
            edges: def.edges,
            start_node: def.start_node,
        })
    }

    pub fn graph_id(&self) -> Option<&str> {
        self.graph_id.as_deref()
    }

    /// Storage assigns the id on first save
    pub fn set_graph_id(&mut self, graph_id: impl Into<String>) {
        self.graph_id = Some(graph_id.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn start_node(&self) -> &str {
        &self.start_node
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Outgoing edge target of `from_node`; `None` means the graph ends there
    pub fn get_next_node(&self, from_node: &str) -> Option<&EdgeTarget> {
        self.edges
            .iter()
            .find(|e| e.from_node == from_node)
            .map(|e| &e.to_node)
    }

    /// Names referenced by the start node or edges that match no node
    /// (`END` excluded), in first-seen order.
    pub fn dangling_references(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = vec![self.start_node.as_str()];
        for edge in &self.edges {
            refs.push(edge.from_node.as_str());
            match &edge.to_node {
                EdgeTarget::Node(name) => refs.push(name),
                EdgeTarget::Conditional(cond) => {
                    refs.push(&cond.true_node);
                    refs.push(&cond.false_node);
                }
            }
        }

        let mut seen = HashSet::new();
        refs.into_iter()
            .filter(|name| *name != END && self.get_node(name).is_none())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

impl TryFrom<GraphDefinition> for Graph {
    type Error = GraphError;

    fn try_from(def: GraphDefinition) -> Result<Self, Self::Error> {
        Graph::new(def)
    }
}

impl From<Graph> for GraphDefinition {
    fn from(graph: Graph) -> Self {
        Self {
            graph_id: graph.graph_id,
            name: graph.name,
            description: graph.description,
            nodes: graph.nodes,
            edges: graph.edges,
            start_node: graph.start_node,
        }
    }
}
