//! Test execution engine
//!
//! Provides sequential, parallel and sharded execution of a test tree.

mod parallel;
mod runner;
mod strategy;

pub use runner::{fold, run_tests, TestRunner};
pub use strategy::{shard_suite, Shard, Strategy};
