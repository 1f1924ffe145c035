//! Assertion outcome models
//!
//! An [`Assertion`] describes a single comparison produced by a test action.
//! The engine only evaluates it; it never builds one itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single comparison handed back by a leaf action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "assert")]
pub enum Assertion {
    /// Expected and actual must be structurally equal
    Equal { expected: Value, actual: Value },

    /// The numbers must be in non-decreasing order
    NumberArraySortedAsc { actual: Vec<f64> },

    /// An `Err` showed up where an `Ok` was required
    UnexpectedErr { value: Value },

    /// An `Ok` showed up where an `Err` was required
    UnexpectedOk { value: Value },

    /// A `None` showed up where a `Some` was required
    UnexpectedNone,
}

impl Assertion {
    /// Evaluate the assertion into a pass or a typed failure
    pub fn evaluate(&self) -> AssertionResult {
        match self {
            Assertion::Equal { expected, actual } => {
                if expected == actual {
                    Ok(())
                } else {
                    Err(AssertionError::NotEqual {
                        expected: expected.clone(),
                        actual: actual.clone(),
                    })
                }
            }
            Assertion::NumberArraySortedAsc { actual } => {
                if actual.windows(2).all(|w| w[0] <= w[1]) {
                    Ok(())
                } else {
                    Err(AssertionError::NotSortedAsc {
                        actual: actual.clone(),
                    })
                }
            }
            Assertion::UnexpectedErr { value } => Err(AssertionError::UnexpectedErr {
                value: value.clone(),
            }),
            Assertion::UnexpectedOk { value } => Err(AssertionError::UnexpectedOk {
                value: value.clone(),
            }),
            Assertion::UnexpectedNone => Err(AssertionError::UnexpectedNone),
        }
    }

    pub fn passes(&self) -> bool {
        self.evaluate().is_ok()
    }
}

/// Outcome of evaluating one assertion
pub type AssertionResult = Result<(), AssertionError>;

/// One evaluated assertion of a multi-assertion test, keyed by its name
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssertionReport {
    pub name: String,
    pub result: AssertionResult,
}

impl AssertionReport {
    pub fn new(name: impl Into<String>, result: AssertionResult) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }

    /// Evaluate a named assertion
    pub fn evaluate(name: impl Into<String>, assertion: &Assertion) -> Self {
        Self::new(name, assertion.evaluate())
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Why an assertion did not hold
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum AssertionError {
    NotEqual { expected: Value, actual: Value },
    NotSortedAsc { actual: Vec<f64> },
    UnexpectedErr { value: Value },
    UnexpectedOk { value: Value },
    UnexpectedNone,
}

impl AssertionError {
    /// Short machine-friendly name of the failure
    pub fn code(&self) -> &'static str {
        match self {
            AssertionError::NotEqual { .. } => "NotEqual",
            AssertionError::NotSortedAsc { .. } => "NotSortedAsc",
            AssertionError::UnexpectedErr { .. } => "UnexpectedErr",
            AssertionError::UnexpectedOk { .. } => "UnexpectedOk",
            AssertionError::UnexpectedNone => "UnexpectedNone",
        }
    }
}

impl fmt::Display for AssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionError::NotEqual { expected, actual } => {
                write!(f, "expected {expected} but got {actual}")
            }
            AssertionError::NotSortedAsc { actual } => {
                write!(f, "expected ascending order: {actual:?}")
            }
            AssertionError::UnexpectedErr { value } => write!(f, "unexpected error: {value}"),
            AssertionError::UnexpectedOk { value } => write!(f, "unexpected success: {value}"),
            AssertionError::UnexpectedNone => write!(f, "unexpected none"),
        }
    }
}

/// What a leaf action hands back to the engine
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Single(Assertion),
    Multiple(Vec<Assertion>),
    Named(Vec<(String, Assertion)>),
}

impl Verdict {
    /// Every assertion with its name; unnamed ones are numbered from 1
    pub fn into_named(self) -> Vec<(String, Assertion)> {
        match self {
            Verdict::Single(assertion) => vec![("assertion 1".to_string(), assertion)],
            Verdict::Multiple(assertions) => assertions
                .into_iter()
                .enumerate()
                .map(|(i, assertion)| (format!("assertion {}", i + 1), assertion))
                .collect(),
            Verdict::Named(assertions) => assertions,
        }
    }
}

/// Conversion from an action's return value into a [`Verdict`]
pub trait IntoVerdict {
    fn into_verdict(self) -> Verdict;
}

impl IntoVerdict for Verdict {
    fn into_verdict(self) -> Verdict {
        self
    }
}

impl IntoVerdict for Assertion {
    fn into_verdict(self) -> Verdict {
        Verdict::Single(self)
    }
}

impl IntoVerdict for Vec<Assertion> {
    fn into_verdict(self) -> Verdict {
        Verdict::Multiple(self)
    }
}

impl<S: Into<String>> IntoVerdict for Vec<(S, Assertion)> {
    fn into_verdict(self) -> Verdict {
        Verdict::Named(
            self.into_iter()
                .map(|(name, assertion)| (name.into(), assertion))
                .collect(),
        )
    }
}

impl<T, E> IntoVerdict for Result<T, E>
where
    T: IntoVerdict,
    E: fmt::Display,
{
    fn into_verdict(self) -> Verdict {
        match self {
            Ok(v) => v.into_verdict(),
            Err(e) => Verdict::Single(Assertion::UnexpectedErr {
                value: Value::String(e.to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_evaluation() {
        let pass = Assertion::Equal {
            expected: json!({"a": [1, 2]}),
            actual: json!({"a": [1, 2]}),
        };
        assert!(pass.passes());

        let fail = Assertion::Equal {
            expected: json!("foo"),
            actual: json!("bar"),
        };
        assert_eq!(
            fail.evaluate(),
            Err(AssertionError::NotEqual {
                expected: json!("foo"),
                actual: json!("bar"),
            })
        );
    }

    #[test]
    fn test_sorted_asc() {
        let sorted = Assertion::NumberArraySortedAsc {
            actual: vec![1.0, 1.0, 2.5],
        };
        assert!(sorted.passes());

        let unsorted = Assertion::NumberArraySortedAsc {
            actual: vec![3.0, 1.0],
        };
        assert_eq!(unsorted.evaluate().unwrap_err().code(), "NotSortedAsc");

        let empty = Assertion::NumberArraySortedAsc { actual: vec![] };
        assert!(empty.passes());
    }

    #[test]
    fn test_sentinels_always_fail() {
        assert!(!Assertion::UnexpectedNone.passes());
        assert!(!Assertion::UnexpectedErr { value: json!(1) }.passes());
        assert!(!Assertion::UnexpectedOk { value: json!(1) }.passes());
    }

    #[test]
    fn test_result_into_verdict() {
        let ok: Result<Assertion, &str> = Ok(Assertion::UnexpectedNone);
        assert_eq!(ok.into_verdict(), Verdict::Single(Assertion::UnexpectedNone));

        let err: Result<Assertion, &str> = Err("boom");
        assert_eq!(
            err.into_verdict(),
            Verdict::Single(Assertion::UnexpectedErr {
                value: json!("boom")
            })
        );
    }

    #[test]
    fn test_named_verdict() {
        let verdict = vec![
            ("status", Assertion::UnexpectedNone),
            ("body", Assertion::UnexpectedNone),
        ]
        .into_verdict();
        let names: Vec<String> = verdict.into_named().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["status", "body"]);

        let unnamed = vec![Assertion::UnexpectedNone, Assertion::UnexpectedNone].into_verdict();
        let names: Vec<String> = unnamed.into_named().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["assertion 1", "assertion 2"]);
    }

    #[test]
    fn test_report_evaluation() {
        let report = AssertionReport::evaluate("missing", &Assertion::UnexpectedNone);
        assert_eq!(report.name, "missing");
        assert!(!report.is_ok());
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"name": "missing", "result": {"Err": {"code": "UnexpectedNone"}}})
        );
    }
}
