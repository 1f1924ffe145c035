//! Data models for suite execution
//!
//! Test unit trees, assertion outcomes and the result tree.

mod assertion;
mod outcome;
mod unit;

pub use assertion::{
    Assertion, AssertionError, AssertionReport, AssertionResult, IntoVerdict, Verdict,
};
pub use outcome::{
    flatten, GroupOutcome, LeafEntry, ShardingError, SuiteError, SuiteResult, SuiteSummary,
    TestError, TestOutcome, UnitOutcome,
};
pub use unit::{
    find_duplicate_name, group, leaf_count, test, TestAction, TestFuture, TestUnit, UnitKind,
};
