//! Configuration module
//!
//! Handles loading and managing runner configuration. Values are layered:
//! command line over environment over file over defaults.

mod env;
mod file;

use serde::{Deserialize, Serialize};

use crate::executor::Strategy;
use crate::output::OutputFormat;

pub use env::EnvConfig;

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Concurrency strategy
    #[serde(rename = "concurrency")]
    pub strategy: Strategy,

    /// Report format
    pub format: OutputFormat,

    /// Colorize pretty output
    pub color: bool,

    /// Log level for the runner's own diagnostics
    pub log_level: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            format: OutputFormat::default(),
            color: true,
            log_level: "warn".to_string(),
        }
    }
}
