// SPDX-License-Identifier: MIT

//! Built-in step functions

pub mod code_review;
