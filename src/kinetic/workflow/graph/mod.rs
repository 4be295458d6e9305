// SPDX-License-Identifier: MIT

//! Graph-based workflow execution
//!
//! This module provides the graph model (nodes, plain and conditional
//! edges) and the engine that walks it one node at a time.

pub mod executor;
pub mod types;

pub use executor::{
    ExecutionLogEntry, ExecutionResult, GraphEngine, RunStatus, StepStatus,
    DEFAULT_MAX_ITERATIONS,
};
pub use types::{ConditionalEdge, Edge, EdgeTarget, Graph, GraphDefinition, Node, END};
