// SPDX-License-Identifier: MIT

//! graphflow-rs: run declarative workflow graphs of named steps
//!
//! - `adk` holds the step-function contract and error types.
//! - `kinetic` holds the graph model, the engine, storage, the HTTP
//!   service and the built-in code review workflow.

pub mod adk;
pub mod kinetic;
