//! Test unit tree
//!
//! A suite is an ordered list of [`TestUnit`]s. Each unit is either a leaf
//! test with an async action or a group of nested units.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::assertion::{IntoVerdict, Verdict};

/// Boxed future returned by a leaf action
pub type TestFuture = BoxFuture<'static, Verdict>;

/// Leaf action; callable repeatedly so a tree can be run more than once
pub type TestAction = Arc<dyn Fn() -> TestFuture + Send + Sync>;

/// A named node in the test tree
#[derive(Clone)]
pub struct TestUnit {
    name: String,
    kind: UnitKind,
}

/// Leaf or group
#[derive(Clone)]
pub enum UnitKind {
    Leaf(TestAction),
    Group(Vec<TestUnit>),
}

impl TestUnit {
    /// Create a leaf test from an async action
    pub fn test<F, Fut, R>(name: impl Into<String>, act: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoVerdict + 'static,
    {
        let action: TestAction = Arc::new(move || act().map(IntoVerdict::into_verdict).boxed());
        Self {
            name: name.into(),
            kind: UnitKind::Leaf(action),
        }
    }

    /// Create a group of nested units
    pub fn group(name: impl Into<String>, children: impl IntoIterator<Item = TestUnit>) -> Self {
        Self {
            name: name.into(),
            kind: UnitKind::Group(children.into_iter().collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &UnitKind {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, UnitKind::Leaf(_))
    }

    /// Children of a group; empty for a leaf
    pub fn children(&self) -> &[TestUnit] {
        match &self.kind {
            UnitKind::Leaf(_) => &[],
            UnitKind::Group(children) => children,
        }
    }

    /// Number of leaves under this unit, counting itself if it is a leaf
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            UnitKind::Leaf(_) => 1,
            UnitKind::Group(children) => children.iter().map(TestUnit::leaf_count).sum(),
        }
    }
}

impl fmt::Debug for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            UnitKind::Leaf(_) => f.debug_struct("Leaf").field("name", &self.name).finish(),
            UnitKind::Group(children) => f
                .debug_struct("Group")
                .field("name", &self.name)
                .field("children", children)
                .finish(),
        }
    }
}

/// Shorthand for [`TestUnit::test`]
pub fn test<F, Fut, R>(name: impl Into<String>, act: F) -> TestUnit
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoVerdict + 'static,
{
    TestUnit::test(name, act)
}

/// Shorthand for [`TestUnit::group`]
pub fn group(name: impl Into<String>, children: impl IntoIterator<Item = TestUnit>) -> TestUnit {
    TestUnit::group(name, children)
}

/// Find the first sibling name that appears twice, walking depth-first
pub fn find_duplicate_name(units: &[TestUnit]) -> Option<&str> {
    let mut seen = HashSet::new();
    for unit in units {
        if !seen.insert(unit.name()) {
            return Some(unit.name());
        }
    }
    units
        .iter()
        .find_map(|unit| find_duplicate_name(unit.children()))
}

/// Total number of leaves in a suite
pub fn leaf_count(units: &[TestUnit]) -> usize {
    units.iter().map(TestUnit::leaf_count).sum()
}
