//! suite-runner - tree-structured async test execution
//!
//! Runs a tree of named tests and groups under a concurrency strategy and
//! folds every outcome into a single [`SuiteResult`].
//!
//! ## Features
//!
//! - Sequential execution with optional fail-fast (the default)
//! - Parallel execution with an optional concurrency cap
//! - Deterministic round-robin sharding for CI fan-out
//! - Multi-assertion tests that keep every assertion result
//! - Panicking tests reported as failures, never crashing the run
//! - Pretty, JSON and CSV reports
//!
//! ## Usage
//!
//! ```ignore
//! use suite_runner::{assert, group, run_tests, test, Strategy};
//!
//! let suite = vec![
//!     test("adds", || async { assert::equal(4, 2 + 2) }),
//!     group("strings", vec![
//!         test("trims", || async { assert::equal("a", " a ".trim()) }),
//!     ]),
//! ];
//!
//! let result = run_tests(&suite, Strategy::default()).await;
//! assert!(result.is_ok());
//! ```

pub mod assert;
pub mod cli;
pub mod config;
pub mod executor;
pub mod harness;
pub mod models;
pub mod output;
pub mod utils;

pub use executor::{run_tests, Shard, Strategy, TestRunner};
pub use harness::{exit_code, run_main, Harness};
pub use models::{
    group, test, Assertion, AssertionError, GroupOutcome, ShardingError, SuiteError, SuiteResult,
    SuiteSummary, TestError, TestOutcome, TestUnit, UnitOutcome,
};
