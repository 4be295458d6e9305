// SPDX-License-Identifier: MIT

use crate::adk::error::FlowError;
use crate::adk::tool::StepFunction;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps step-function names to executable steps.
///
/// Populated once at startup, then shared read-only (usually behind an
/// `Arc`) by every run. Registration needs `&mut self`, so a shared registry
/// cannot change under a running graph.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn StepFunction>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a step under `name`. A later registration with the same
    /// name replaces the earlier one.
    pub fn register<S>(&mut self, name: impl Into<String>, step: S)
    where
        S: StepFunction + 'static,
    {
        self.register_arc(name, Arc::new(step));
    }

    /// Register an already shared step
    pub fn register_arc(&mut self, name: impl Into<String>, step: Arc<dyn StepFunction>) {
        let name = name.into();
        if self.tools.insert(name.clone(), step).is_some() {
            log::debug!("Replaced step function: {}", name);
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn StepFunction>, FlowError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| FlowError::function_not_found(name))
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::tool::StepOutcome;
    use crate::kinetic::workflow::state::WorkflowState;
    use serde_json::json;

    /// A step that writes a fixed marker into the state
    struct MarkerStep {
        marker: &'static str,
    }

    impl StepFunction for MarkerStep {
        fn call(&self, state: &mut WorkflowState) -> Result<StepOutcome, FlowError> {
            state.set("marker", json!(self.marker));
            Ok(StepOutcome::Unchanged)
        }
    }

    #[test]
    fn test_register_and_get_step() {
        let mut registry = ToolRegistry::new();
        registry.register("mark", MarkerStep { marker: "a" });

        assert!(registry.has("mark"));
        let step = registry.get("mark").unwrap();

        let mut state = WorkflowState::empty();
        step.call(&mut state).unwrap();
        assert_eq!(state.get("marker"), Some(&json!("a")));
    }

    #[test]
    fn test_get_nonexistent_step() {
        let registry = ToolRegistry::new();

        assert!(!registry.has("nonexistent"));
        match registry.get("nonexistent") {
            Err(FlowError::FunctionNotFound { name }) => assert_eq!(name, "nonexistent"),
            _ => panic!("Expected FunctionNotFound"),
        }
    }

    #[test]
    fn test_register_closure() {
        let mut registry = ToolRegistry::new();
        registry.register("double", |state: &mut WorkflowState| -> Result<StepOutcome, FlowError> {
            let n = state.get_or("n", json!(0)).as_i64().unwrap_or(0);
            StepOutcome::merge(json!({"n": n * 2}))
        });

        let mut state = WorkflowState::empty();
        state.set("n", json!(21));
        let outcome = registry.get("double").unwrap().call(&mut state).unwrap();
        assert_eq!(outcome, StepOutcome::merge(json!({"n": 42})).unwrap());
    }

    #[test]
    fn test_register_overwrites_existing() {
        let mut registry = ToolRegistry::new();

        registry.register("same_name", MarkerStep { marker: "first" });
        registry.register("same_name", MarkerStep { marker: "second" });
        assert_eq!(registry.len(), 1);

        // Last registration wins
        let mut state = WorkflowState::empty();
        registry
            .get("same_name")
            .unwrap()
            .call(&mut state)
            .unwrap();
        assert_eq!(state.get("marker"), Some(&json!("second")));
    }

    #[test]
    fn test_list_is_sorted() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register("tool3", MarkerStep { marker: "3" });
        registry.register("tool1", MarkerStep { marker: "1" });
        registry.register("tool2", MarkerStep { marker: "2" });

        assert_eq!(registry.list(), vec!["tool1", "tool2", "tool3"]);
    }

    #[test]
    fn test_registry_clone_shares_steps() {
        let mut registry = ToolRegistry::new();
        registry.register("tool1", MarkerStep { marker: "1" });

        let mut cloned = registry.clone();
        cloned.register("tool2", MarkerStep { marker: "2" });

        assert!(cloned.has("tool1"));
        // Clones are independent maps
        assert!(!registry.has("tool2"));
    }
}
