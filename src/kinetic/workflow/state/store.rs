// SPDX-License-Identifier: MIT

//! Runtime state storage for workflow execution

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adk::error::FlowError;

/// Key-value state threaded through every node of a run.
///
/// `data` is the working state read and written by step functions.
/// `metadata` is carried along untouched by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl WorkflowState {
    /// Create a state from initial data
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            metadata: Map::new(),
        }
    }

    /// Create an empty WorkflowState
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a state from an arbitrary JSON value, which must be an object
    /// (or null, meaning empty).
    pub fn from_value(value: Value) -> Result<Self, FlowError> {
        match value {
            Value::Object(data) => Ok(Self::new(data)),
            Value::Null => Ok(Self::empty()),
            other => Err(FlowError::InvalidState(format!(
                "initial state must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a field value, falling back to `default` when absent
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.data.get(key).cloned().unwrap_or(default)
    }

    /// Insert or overwrite a field
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Overwrite or insert each key of `updates`; other keys are kept
    pub fn merge(&mut self, updates: Map<String, Value>) {
        for (key, value) in updates {
            self.data.insert(key, value);
        }
    }

    /// Independent copy of `data` and `metadata` for the execution log
    pub fn snapshot(&self) -> WorkflowState {
        self.clone()
    }

    /// Convert state to `{"data": ..., "metadata": ...}`
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("data".to_string(), Value::Object(self.data.clone()));
        obj.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        Value::Object(obj)
    }

    /// Get all data keys
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }
}
