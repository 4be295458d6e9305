// SPDX-License-Identifier: MIT

pub mod config;
pub mod server;
pub mod storage;
pub mod tools;
pub mod workflow;
