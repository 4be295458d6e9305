// SPDX-License-Identifier: MIT

//! Condition evaluation for conditional edges
//!
//! A conditional edge compares one state value against a literal:
//! - `quality_score < 7.0`
//! - `status == "done"`

mod ast;
mod evaluator;

pub use ast::CompareOp;
pub use evaluator::compare;
