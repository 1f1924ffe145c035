//! Output formatting module
//!
//! Renders suite results for humans and machines.

mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
