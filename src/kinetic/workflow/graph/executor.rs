//! Graph workflow executor

use crate::adk::error::FlowError;
use crate::adk::tool::StepOutcome;
use crate::kinetic::workflow::registry::ToolRegistry;
use crate::kinetic::workflow::state::WorkflowState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};

use super::types::{EdgeTarget, Graph, Node, END};

/// Safety limit on log entries per run
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Outcome of a single node visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

/// One entry of the execution log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// 1-based, increases by one per entry
    pub step: usize,
    pub node: String,
    pub status: StepStatus,
    pub message: String,
    pub state_snapshot: WorkflowState,
}

/// Overall status of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Final state and log of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub final_state: WorkflowState,
    pub execution_log: Vec<ExecutionLogEntry>,
}

impl ExecutionResult {
    /// `Completed` unless the run stopped on an error entry
    pub fn status(&self) -> RunStatus {
        match self.execution_log.last() {
            Some(entry) if entry.status == StepStatus::Error => RunStatus::Failed,
            _ => RunStatus::Completed,
        }
    }

    /// Node names in visit order
    pub fn visited(&self) -> Vec<&str> {
        self.execution_log.iter().map(|e| e.node.as_str()).collect()
    }
}

/// Drives a graph node by node against a registry of step functions.
///
/// The engine borrows both the graph and the registry; many engines (and so
/// many runs) can share them at once.
pub struct GraphEngine<'a> {
    graph: &'a Graph,
    registry: &'a ToolRegistry,
    max_iterations: usize,
}

impl<'a> GraphEngine<'a> {
    pub fn new(graph: &'a Graph, registry: &'a ToolRegistry) -> Self {
        Self {
            graph,
            registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Run with an arbitrary JSON initial state, which must be an object
    pub fn execute_value(&self, initial_state: Value) -> Result<ExecutionResult, FlowError> {
        let state = WorkflowState::from_value(initial_state)?;
        Ok(self.execute(state.data))
    }

    /// Run the graph from `start_node` until `END`, a fatal error, or the
    /// iteration limit. Never fails: problems end up as the last log entry.
    pub fn execute(&self, initial_state: Map<String, Value>) -> ExecutionResult {
        let mut state = WorkflowState::new(initial_state);
        let mut log: Vec<ExecutionLogEntry> = Vec::new();
        let mut current = self.graph.start_node().to_string();

        log::info!("Starting graph execution: {}", self.graph.name());

        while current != END {
            if log.len() >= self.max_iterations {
                let message = format!(
                    "Maximum iterations ({}) reached. Possible infinite loop.",
                    self.max_iterations
                );
                log::error!("{}", message);
                record(&mut log, &current, StepStatus::Error, message, &state);
                break;
            }

            let Some(node) = self.graph.get_node(&current) else {
                let message = format!("Node '{}' not found in graph", current);
                log::error!("{}", message);
                record(&mut log, &current, StepStatus::Error, message, &state);
                break;
            };

            if let Err(e) = self.execute_node(node, &mut state) {
                log::error!("Error in node {}: {}", current, e);
                let message = format!("Error executing node '{}': {}", current, e);
                record(&mut log, &current, StepStatus::Error, message, &state);
                break;
            }

            let message = format!("Node '{}' executed successfully", current);
            record(&mut log, &current, StepStatus::Success, message, &state);

            match self.next_node(&current, &state) {
                Ok(next) => current = next,
                Err(e) => {
                    log::error!("Error routing from node {}: {}", current, e);
                    let message = format!("Error routing from node '{}': {}", current, e);
                    record(&mut log, &current, StepStatus::Error, message, &state);
                    break;
                }
            }
        }

        log::info!("Graph execution completed. Total steps: {}", log.len());

        ExecutionResult {
            final_state: state,
            execution_log: log,
        }
    }

    /// Run one node's step and fold its outcome into `state`
    fn execute_node(&self, node: &Node, state: &mut WorkflowState) -> Result<(), FlowError> {
        let step = self.registry.get(&node.function_name)?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| step.call(state)))
            .map_err(|payload| FlowError::step(panic_message(payload.as_ref())))??;

        match outcome {
            StepOutcome::Replace(new_state) => *state = new_state,
            StepOutcome::Merge(updates) => state.merge(updates),
            StepOutcome::Unchanged => {}
        }
        Ok(())
    }

    fn next_node(&self, current: &str, state: &WorkflowState) -> Result<String, FlowError> {
        match self.graph.get_next_node(current) {
            None => Ok(END.to_string()),
            Some(EdgeTarget::Node(name)) => Ok(name.clone()),
            Some(EdgeTarget::Conditional(edge)) => edge.evaluate(state).map(str::to_string),
        }
    }
}

fn record(
    log: &mut Vec<ExecutionLogEntry>,
    node: &str,
    status: StepStatus,
    message: String,
    state: &WorkflowState,
) {
    log.push(ExecutionLogEntry {
        step: log.len() + 1,
        node: node.to_string(),
        status,
        message,
        state_snapshot: state.snapshot(),
    });
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("step panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("step panicked: {}", s)
    } else {
        "step panicked".to_string()
    }
}
