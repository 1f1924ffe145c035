//! Parallel test execution
//!
//! Issues every leaf of the tree concurrently within the current task,
//! optionally bounded by a semaphore. Results are reassembled in declaration
//! order, whatever order the leaves settle in.

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::debug;

use super::runner::run_leaf;
use crate::models::{GroupOutcome, TestUnit, UnitKind, UnitOutcome};

/// Run all leaves concurrently, at most `max_concurrency` at a time
///
/// A cap of zero is treated as one.
pub(crate) async fn run_parallel(
    units: &[TestUnit],
    max_concurrency: Option<usize>,
) -> Vec<UnitOutcome> {
    let semaphore = max_concurrency.map(|n| Semaphore::new(n.max(1)));
    debug!(
        "Parallel execution with {}",
        max_concurrency.map_or("no limit".to_string(), |n| format!("max {} concurrent", n.max(1)))
    );
    run_units(units, semaphore.as_ref()).await
}

fn run_units<'a>(
    units: &'a [TestUnit],
    semaphore: Option<&'a Semaphore>,
) -> BoxFuture<'a, Vec<UnitOutcome>> {
    let handles = units.iter().map(move |unit| async move {
        match unit.kind() {
            UnitKind::Leaf(action) => {
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };
                UnitOutcome::from(run_leaf(unit.name(), action).await)
            }
            UnitKind::Group(children) => {
                let results = run_units(children, semaphore).await;
                UnitOutcome::from(GroupOutcome::new(unit.name(), results))
            }
        }
    });

    join_all(handles).boxed()
}
