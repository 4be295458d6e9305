// SPDX-License-Identifier: MIT

//! State management for graph workflows
//!
//! `WorkflowState` is the key-value bag every node reads and writes.

mod store;

pub use store::WorkflowState;
