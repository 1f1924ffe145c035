//! Result tree and suite error models
//!
//! Outcomes mirror the input tree: one [`TestOutcome`] per scheduled leaf and
//! one [`GroupOutcome`] per group, in declaration order.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use super::assertion::{AssertionError, AssertionReport};

/// Why a leaf did not pass
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum TestError {
    /// The single assertion returned by the action failed
    AssertionFailed(AssertionError),

    /// At least one of several assertions failed; every result is kept in order
    MultipleAssertionFailed { results: Vec<AssertionReport> },

    /// Never started because an earlier test failed under fail-fast
    Skipped,
}

impl TestError {
    pub fn code(&self) -> &'static str {
        match self {
            TestError::AssertionFailed(e) => e.code(),
            TestError::MultipleAssertionFailed { .. } => "MultipleAssertionFailed",
            TestError::Skipped => "Skipped",
        }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::AssertionFailed(e) => write!(f, "{e}"),
            TestError::MultipleAssertionFailed { results } => {
                let failed = results.iter().filter(|r| !r.is_ok()).count();
                write!(f, "{failed} of {} assertions failed", results.len())
            }
            TestError::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome of a single leaf
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestOutcome {
    Pass {
        name: String,
        #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
        elapsed: Duration,
    },
    Fail {
        name: String,
        error: TestError,
    },
}

impl TestOutcome {
    pub fn pass(name: impl Into<String>, elapsed: Duration) -> Self {
        TestOutcome::Pass {
            name: name.into(),
            elapsed,
        }
    }

    pub fn fail(name: impl Into<String>, error: TestError) -> Self {
        TestOutcome::Fail {
            name: name.into(),
            error,
        }
    }

    pub fn skipped(name: impl Into<String>) -> Self {
        Self::fail(name, TestError::Skipped)
    }

    pub fn name(&self) -> &str {
        match self {
            TestOutcome::Pass { name, .. } | TestOutcome::Fail { name, .. } => name,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, TestOutcome::Pass { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            TestOutcome::Fail {
                error: TestError::Skipped,
                ..
            }
        )
    }

    pub fn error(&self) -> Option<&TestError> {
        match self {
            TestOutcome::Pass { .. } => None,
            TestOutcome::Fail { error, .. } => Some(error),
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            TestOutcome::Pass { elapsed, .. } => Some(*elapsed),
            TestOutcome::Fail { .. } => None,
        }
    }
}

// Timing is excluded from equality.
impl PartialEq for TestOutcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TestOutcome::Pass { name: a, .. }, TestOutcome::Pass { name: b, .. }) => a == b,
            (
                TestOutcome::Fail {
                    name: a,
                    error: ea,
                },
                TestOutcome::Fail {
                    name: b,
                    error: eb,
                },
            ) => a == b && ea == eb,
            _ => false,
        }
    }
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Outcome of a group, children in declaration order
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupOutcome {
    pub name: String,
    pub results: Vec<UnitOutcome>,
}

impl GroupOutcome {
    pub fn new(name: impl Into<String>, results: Vec<UnitOutcome>) -> Self {
        Self {
            name: name.into(),
            results,
        }
    }
}

/// A node of the result tree
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum UnitOutcome {
    Test(TestOutcome),
    Group(GroupOutcome),
}

impl UnitOutcome {
    pub fn name(&self) -> &str {
        match self {
            UnitOutcome::Test(t) => t.name(),
            UnitOutcome::Group(g) => &g.name,
        }
    }

    /// A group passes iff every descendant leaf passed
    pub fn is_pass(&self) -> bool {
        match self {
            UnitOutcome::Test(t) => t.is_pass(),
            UnitOutcome::Group(g) => g.results.iter().all(UnitOutcome::is_pass),
        }
    }
}

impl From<TestOutcome> for UnitOutcome {
    fn from(outcome: TestOutcome) -> Self {
        UnitOutcome::Test(outcome)
    }
}

impl From<GroupOutcome> for UnitOutcome {
    fn from(outcome: GroupOutcome) -> Self {
        UnitOutcome::Group(outcome)
    }
}

/// A leaf outcome together with the names of its enclosing groups
#[derive(Clone, Debug)]
pub struct LeafEntry<'a> {
    pub path: Vec<&'a str>,
    pub outcome: &'a TestOutcome,
}

impl LeafEntry<'_> {
    /// Group path and leaf name joined with `::`
    pub fn full_name(&self) -> String {
        let mut parts = self.path.clone();
        parts.push(self.outcome.name());
        parts.join("::")
    }
}

/// Flatten a result tree into leaf outcomes in declaration order
pub fn flatten(outcomes: &[UnitOutcome]) -> Vec<LeafEntry<'_>> {
    fn walk<'a>(
        outcomes: &'a [UnitOutcome],
        path: &mut Vec<&'a str>,
        out: &mut Vec<LeafEntry<'a>>,
    ) {
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Test(t) => out.push(LeafEntry {
                    path: path.clone(),
                    outcome: t,
                }),
                UnitOutcome::Group(g) => {
                    path.push(&g.name);
                    walk(&g.results, path, out);
                    path.pop();
                }
            }
        }
    }

    let mut out = Vec::new();
    walk(outcomes, &mut Vec::new(), &mut out);
    out
}

/// Invalid shard selection
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "code")]
pub enum ShardingError {
    #[error("shard count must be at least 1")]
    ZeroCount,

    #[error("shard index {index} must be less than shard count {count}")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("shard count {count} exceeds the number of tests ({tests})")]
    CountExceedsTests { count: usize, tests: usize },
}

/// Everything that makes a suite fail
#[derive(Error, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SuiteError {
    /// One or more leaves failed; the full tree is kept so passes stay visible
    #[error("one or more tests failed")]
    TestError { results: Vec<UnitOutcome> },

    #[error("duplicate test name: {name}")]
    DuplicateTestName { name: String },

    #[error("invalid sharding: {value}")]
    ShardingError { value: ShardingError },
}

impl SuiteError {
    /// Variant name, used as the report heading
    pub fn kind(&self) -> &'static str {
        match self {
            SuiteError::TestError { .. } => "TestError",
            SuiteError::DuplicateTestName { .. } => "DuplicateTestName",
            SuiteError::ShardingError { .. } => "ShardingError",
        }
    }

    /// The result tree, if any test ran
    pub fn results(&self) -> Option<&[UnitOutcome]> {
        match self {
            SuiteError::TestError { results } => Some(results),
            _ => None,
        }
    }
}

impl From<ShardingError> for SuiteError {
    fn from(value: ShardingError) -> Self {
        SuiteError::ShardingError { value }
    }
}

/// Terminal result of one run
pub type SuiteResult = Result<Vec<UnitOutcome>, SuiteError>;

/// Leaf counts for a result tree
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

impl SuiteSummary {
    pub fn from_outcomes(outcomes: &[UnitOutcome]) -> Self {
        let mut summary = Self::default();
        for entry in flatten(outcomes) {
            summary.total += 1;
            match entry.outcome {
                TestOutcome::Pass { elapsed, .. } => {
                    summary.passed += 1;
                    summary.duration_ms += elapsed.as_millis() as u64;
                }
                TestOutcome::Fail {
                    error: TestError::Skipped,
                    ..
                } => summary.skipped += 1,
                TestOutcome::Fail { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// Counts for a suite result; structural errors count as zero tests
    pub fn from_result(result: &SuiteResult) -> Self {
        match result {
            Ok(outcomes) => Self::from_outcomes(outcomes),
            Err(e) => e.results().map(Self::from_outcomes).unwrap_or_default(),
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Duration: {}ms",
            self.total, self.passed, self.failed, self.skipped, self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<UnitOutcome> {
        vec![
            TestOutcome::pass("a", Duration::from_millis(5)).into(),
            GroupOutcome::new(
                "g",
                vec![
                    TestOutcome::fail(
                        "b",
                        TestError::AssertionFailed(AssertionError::UnexpectedNone),
                    )
                    .into(),
                    GroupOutcome::new("h", vec![TestOutcome::skipped("c").into()]).into(),
                ],
            )
            .into(),
        ]
    }

    #[test]
    fn test_equality_ignores_timing() {
        let a = TestOutcome::pass("x", Duration::from_millis(1));
        let b = TestOutcome::pass("x", Duration::from_secs(3));
        assert_eq!(a, b);
        assert_ne!(a, TestOutcome::skipped("x"));
    }

    #[test]
    fn test_flatten_paths() {
        let outcomes = sample();
        let names: Vec<String> = flatten(&outcomes).iter().map(LeafEntry::full_name).collect();
        assert_eq!(names, vec!["a", "g::b", "g::h::c"]);
    }

    #[test]
    fn test_summary_counts() {
        let summary = SuiteSummary::from_outcomes(&sample());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.duration_ms, 5);
        assert!(!summary.is_all_passed());
    }

    #[test]
    fn test_group_pass_status() {
        let outcomes = sample();
        assert!(outcomes[0].is_pass());
        assert!(!outcomes[1].is_pass());
        assert!(UnitOutcome::from(GroupOutcome::new("empty", vec![])).is_pass());
    }

    #[test]
    fn test_structural_error_summary_is_empty() {
        let result: SuiteResult = Err(SuiteError::DuplicateTestName { name: "a".into() });
        assert_eq!(SuiteSummary::from_result(&result), SuiteSummary::default());
        assert_eq!(result.unwrap_err().kind(), "DuplicateTestName");
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(&sample()).unwrap();
        assert_eq!(json[0]["unit"], "test");
        assert_eq!(json[0]["status"], "pass");
        assert_eq!(json[0]["elapsed_ms"], 5);
        assert_eq!(json[1]["unit"], "group");
        assert_eq!(json[1]["results"][0]["error"]["code"], "AssertionFailed");
    }
}
