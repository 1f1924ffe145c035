//! Concurrency strategies and shard selection
//!
//! A strategy decides how leaves are executed. It never changes the order
//! of the result tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{leaf_count, ShardingError, TestUnit, UnitKind};

fn default_fail_fast() -> bool {
    true
}

/// How the leaves of a suite are scheduled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Strategy {
    /// One leaf at a time in declaration order
    Sequential {
        #[serde(rename = "failFast", default = "default_fail_fast")]
        fail_fast: bool,
    },

    /// All leaves at once, optionally capped
    Parallel {
        #[serde(rename = "maxConcurrency", default)]
        max_concurrency: Option<usize>,
    },

    /// Only the leaves assigned to shard `index` out of `count`
    Sharded { index: usize, count: usize },
}

impl Strategy {
    pub fn sequential(fail_fast: bool) -> Self {
        Strategy::Sequential { fail_fast }
    }

    pub fn parallel() -> Self {
        Strategy::Parallel {
            max_concurrency: None,
        }
    }

    pub fn parallel_bounded(max_concurrency: usize) -> Self {
        Strategy::Parallel {
            max_concurrency: Some(max_concurrency),
        }
    }

    pub fn sharded(index: usize, count: usize) -> Self {
        Strategy::Sharded { index, count }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::sequential(true)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sequential { fail_fast: true } => write!(f, "sequential (fail-fast)"),
            Strategy::Sequential { fail_fast: false } => write!(f, "sequential"),
            Strategy::Parallel {
                max_concurrency: Some(n),
            } => write!(f, "parallel (max {n})"),
            Strategy::Parallel {
                max_concurrency: None,
            } => write!(f, "parallel"),
            Strategy::Sharded { index, count } => write!(f, "shard {index}/{count}"),
        }
    }
}

/// A shard selection, zero-based
///
/// Leaves are numbered in declaration order across the whole tree and dealt
/// out round-robin: leaf `i` belongs to shard `i % count`. The same `count`
/// always yields the same partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shard {
    pub index: usize,
    pub count: usize,
}

impl Shard {
    pub fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }

    /// Check the selection against the number of leaves in the suite
    pub fn validate(&self, tests: usize) -> Result<(), ShardingError> {
        if self.count == 0 {
            return Err(ShardingError::ZeroCount);
        }
        if self.index >= self.count {
            return Err(ShardingError::IndexOutOfRange {
                index: self.index,
                count: self.count,
            });
        }
        if tests > 0 && self.count > tests {
            return Err(ShardingError::CountExceedsTests {
                count: self.count,
                tests,
            });
        }
        Ok(())
    }

    /// Prune the suite down to this shard's leaves
    ///
    /// The selection is validated first. Groups left without any selected
    /// leaf are dropped.
    pub fn select(&self, units: &[TestUnit]) -> Result<Vec<TestUnit>, ShardingError> {
        self.validate(leaf_count(units))?;
        let mut partitioner = CountPartitioner::new(*self);
        Ok(select_units(units, &mut partitioner))
    }
}

impl FromStr for Shard {
    type Err = String;

    /// Parse `INDEX/COUNT`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, count) = s
            .split_once('/')
            .ok_or_else(|| format!("expected '{s}' to be in the format INDEX/COUNT"))?;
        let index = index
            .trim()
            .parse()
            .map_err(|e| format!("failed to parse shard index '{index}': {e}"))?;
        let count = count
            .trim()
            .parse()
            .map_err(|e| format!("failed to parse shard count '{count}': {e}"))?;
        Ok(Shard::new(index, count))
    }
}

impl From<Shard> for Strategy {
    fn from(shard: Shard) -> Self {
        Strategy::sharded(shard.index, shard.count)
    }
}

#[derive(Debug)]
struct CountPartitioner {
    shard: Shard,
    curr: usize,
}

impl CountPartitioner {
    fn new(shard: Shard) -> Self {
        Self { shard, curr: 0 }
    }

    fn test_matches(&mut self) -> bool {
        let matches = self.curr == self.shard.index;
        self.curr = (self.curr + 1) % self.shard.count;
        matches
    }
}

fn select_units(units: &[TestUnit], partitioner: &mut CountPartitioner) -> Vec<TestUnit> {
    let mut selected = Vec::new();
    for unit in units {
        match unit.kind() {
            UnitKind::Leaf(_) => {
                if partitioner.test_matches() {
                    selected.push(unit.clone());
                }
            }
            UnitKind::Group(children) => {
                let children = select_units(children, partitioner);
                if !children.is_empty() {
                    selected.push(TestUnit::group(unit.name(), children));
                }
            }
        }
    }
    selected
}

/// Validate and apply a shard in one step
pub fn shard_suite(units: &[TestUnit], shard: Shard) -> Result<Vec<TestUnit>, ShardingError> {
    shard.select(units)
}
