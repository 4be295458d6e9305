use serde_json::{Map, Value};

use crate::adk::error::FlowError;
use crate::kinetic::workflow::state::WorkflowState;

/// What a step function hands back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Use this state from now on
    Replace(WorkflowState),
    /// Merge these keys into the current state
    Merge(Map<String, Value>),
    /// The step mutated the state in place (or left it alone)
    Unchanged,
}

impl StepOutcome {
    /// Build a `Merge` outcome from a `json!({...})` value. Anything other
    /// than an object is rejected.
    pub fn merge(value: Value) -> Result<Self, FlowError> {
        match value {
            Value::Object(map) => Ok(Self::Merge(map)),
            other => Err(FlowError::InvalidState(format!(
                "step updates must be a JSON object, got {}",
                other
            ))),
        }
    }
}

/// Trait for the executable unit behind a node.
///
/// Steps run synchronously on the caller's thread and must be safe to share
/// across concurrent runs. Closures of the right shape implement this trait
/// directly.
pub trait StepFunction: Send + Sync {
    /// Run the step against the current state
    fn call(&self, state: &mut WorkflowState) -> Result<StepOutcome, FlowError>;
}

impl<F> StepFunction for F
where
    F: Fn(&mut WorkflowState) -> Result<StepOutcome, FlowError> + Send + Sync,
{
    fn call(&self, state: &mut WorkflowState) -> Result<StepOutcome, FlowError> {
        self(state)
    }
}
