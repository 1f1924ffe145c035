//! Assertion builders
//!
//! Helpers that turn a comparison into an [`Assertion`] for a leaf action to
//! return. They only build data; the runner evaluates it.
//!
//! ```ignore
//! use suite_runner::{assert, test};
//!
//! let unit = test("parses", || async {
//!     assert::ok("42".parse::<i32>(), |n| assert::equal(42, n))
//! });
//! ```

use serde::Serialize;
use serde_json::Value;
use std::future::Future;

use crate::models::Assertion;

/// Convert any serializable value into an assertion payload
///
/// Values that cannot be serialized are kept as a descriptive string.
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| Value::String(format!("<unserializable: {e}>")))
}

/// `expected` and `actual` must be structurally equal
pub fn equal<T: Serialize>(expected: T, actual: T) -> Assertion {
    Assertion::Equal {
        expected: to_payload(&expected),
        actual: to_payload(&actual),
    }
}

/// Like [`equal`], for values of different types
pub fn equal_value(expected: impl Serialize, actual: impl Serialize) -> Assertion {
    Assertion::Equal {
        expected: to_payload(&expected),
        actual: to_payload(&actual),
    }
}

/// The numbers must be in non-decreasing order
pub fn numbers_sorted_asc<N: Into<f64> + Copy>(actual: &[N]) -> Assertion {
    Assertion::NumberArraySortedAsc {
        actual: actual.iter().map(|&n| n.into()).collect(),
    }
}

/// Assert on the content of a `Some`; `None` always fails
pub fn option<T>(value: Option<T>, to_assert: impl FnOnce(T) -> Assertion) -> Assertion {
    match value {
        Some(v) => to_assert(v),
        None => Assertion::UnexpectedNone,
    }
}

/// Assert on the content of an `Ok`; an `Err` always fails
pub fn ok<T, E: Serialize>(
    value: Result<T, E>,
    to_assert: impl FnOnce(T) -> Assertion,
) -> Assertion {
    match value {
        Ok(v) => to_assert(v),
        Err(e) => Assertion::UnexpectedErr {
            value: to_payload(&e),
        },
    }
}

/// Assert on the content of an `Err`; an `Ok` always fails
pub fn err<T: Serialize, E>(
    value: Result<T, E>,
    to_assert: impl FnOnce(E) -> Assertion,
) -> Assertion {
    match value {
        Ok(v) => Assertion::UnexpectedOk {
            value: to_payload(&v),
        },
        Err(e) => to_assert(e),
    }
}

/// [`ok`] for a future resolving to a `Result`
pub async fn ok_async<T, E, F>(value: F, to_assert: impl FnOnce(T) -> Assertion) -> Assertion
where
    E: Serialize,
    F: Future<Output = Result<T, E>>,
{
    ok(value.await, to_assert)
}

/// [`err`] for a future resolving to a `Result`
pub async fn err_async<T, E, F>(value: F, to_assert: impl FnOnce(E) -> Assertion) -> Assertion
where
    T: Serialize,
    F: Future<Output = Result<T, E>>,
{
    err(value.await, to_assert)
}
