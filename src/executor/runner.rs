//! Test execution runner
//!
//! Validates a suite, runs it under a [`Strategy`] and folds the result tree
//! into a [`SuiteResult`].

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info, warn};

use super::parallel;
use super::strategy::{shard_suite, Shard, Strategy};
use crate::models::{
    find_duplicate_name, leaf_count, AssertionError, AssertionReport, GroupOutcome, SuiteError,
    SuiteResult, SuiteSummary, TestAction, TestError, TestOutcome, TestUnit, UnitKind,
    UnitOutcome, Verdict,
};
use crate::utils::Timer;

/// Runs a suite of test units
#[derive(Clone, Debug, Default)]
pub struct TestRunner {
    strategy: Strategy,
}

impl TestRunner {
    /// Create a new test runner
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Run the suite and return its terminal result
    ///
    /// Structural problems (duplicate sibling names, an invalid shard) are
    /// reported before any action is invoked. Failures inside actions,
    /// panics included, never escape: they end up in the result tree.
    pub async fn run(&self, units: &[TestUnit]) -> SuiteResult {
        if let Some(name) = find_duplicate_name(units) {
            warn!("Duplicate test name: {}", name);
            return Err(SuiteError::DuplicateTestName {
                name: name.to_string(),
            });
        }

        info!("Running {} tests ({})", leaf_count(units), self.strategy);
        let timer = Timer::start("suite");

        let outcomes = match self.strategy {
            Strategy::Sequential { fail_fast } => run_sequential(units, fail_fast).await,
            Strategy::Parallel { max_concurrency } => {
                parallel::run_parallel(units, max_concurrency).await
            }
            Strategy::Sharded { index, count } => {
                let selected = match shard_suite(units, Shard::new(index, count)) {
                    Ok(selected) => selected,
                    Err(e) => {
                        warn!("Invalid sharding: {}", e);
                        return Err(e.into());
                    }
                };
                debug!("Shard {}/{} selected {} tests", index, count, leaf_count(&selected));
                run_sequential(&selected, false).await
            }
        };

        let summary = SuiteSummary::from_outcomes(&outcomes);
        info!(
            "Suite completed in {}ms - Pass: {} | Fail: {} | Skip: {}",
            timer.stop().as_millis(),
            summary.passed,
            summary.failed,
            summary.skipped
        );

        fold(outcomes)
    }
}

/// Run a suite with the given strategy
pub async fn run_tests(units: &[TestUnit], strategy: Strategy) -> SuiteResult {
    TestRunner::new(strategy).run(units).await
}

/// Fold a finished result tree into a suite result
pub fn fold(outcomes: Vec<UnitOutcome>) -> SuiteResult {
    if outcomes.iter().all(UnitOutcome::is_pass) {
        Ok(outcomes)
    } else {
        Err(SuiteError::TestError { results: outcomes })
    }
}

/// Run the suite one leaf at a time
pub(crate) async fn run_sequential(units: &[TestUnit], fail_fast: bool) -> Vec<UnitOutcome> {
    let mut failed = false;
    run_sequential_units(units, fail_fast, &mut failed).await
}

fn run_sequential_units<'a>(
    units: &'a [TestUnit],
    fail_fast: bool,
    failed: &'a mut bool,
) -> BoxFuture<'a, Vec<UnitOutcome>> {
    async move {
        let mut outcomes = Vec::with_capacity(units.len());
        for unit in units {
            let outcome = match unit.kind() {
                UnitKind::Leaf(_) if fail_fast && *failed => {
                    debug!("Skipping {}", unit.name());
                    TestOutcome::skipped(unit.name()).into()
                }
                UnitKind::Leaf(action) => {
                    let outcome = run_leaf(unit.name(), action).await;
                    if !outcome.is_pass() {
                        *failed = true;
                    }
                    outcome.into()
                }
                UnitKind::Group(children) => {
                    let results = run_sequential_units(children, fail_fast, &mut *failed).await;
                    GroupOutcome::new(unit.name(), results).into()
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
    .boxed()
}

/// Invoke one leaf action and evaluate what it returned
pub(crate) async fn run_leaf(name: &str, action: &TestAction) -> TestOutcome {
    debug!("Running {}", name);
    let timer = Timer::start(name);

    let verdict = AssertUnwindSafe(async { action().await })
        .catch_unwind()
        .await;

    let error = match verdict {
        Ok(verdict) => evaluate(verdict),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("Test {} panicked: {}", name, message);
            Some(TestError::AssertionFailed(AssertionError::UnexpectedErr {
                value: Value::String(message),
            }))
        }
    };
    let elapsed = timer.stop();

    match error {
        None => {
            debug!("{} passed in {}ms", name, elapsed.as_millis());
            TestOutcome::pass(name, elapsed)
        }
        Some(error) => {
            debug!("{} failed: {}", name, error);
            TestOutcome::fail(name, error)
        }
    }
}

fn evaluate(verdict: Verdict) -> Option<TestError> {
    match verdict {
        Verdict::Single(assertion) => assertion.evaluate().err().map(TestError::AssertionFailed),
        verdict => {
            let results: Vec<_> = verdict
                .into_named()
                .into_iter()
                .map(|(name, assertion)| AssertionReport::evaluate(name, &assertion))
                .collect();
            if results.iter().all(AssertionReport::is_ok) {
                None
            } else {
                Some(TestError::MultipleAssertionFailed { results })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    }
}
