//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use anyhow::{bail, Context, Result};
use std::env;

use super::RunnerConfig;
use crate::executor::{Shard, Strategy};
use crate::output::OutputFormat;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITE_RUNNER";

/// Overrides read from `SUITE_RUNNER_*` variables
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvConfig {
    /// `sequential` or `parallel`, from SUITE_RUNNER_CONCURRENCY
    pub concurrency: Option<String>,
    /// From SUITE_RUNNER_FAIL_FAST
    pub fail_fast: Option<bool>,
    /// From SUITE_RUNNER_MAX_CONCURRENCY
    pub max_concurrency: Option<String>,
    /// `INDEX/COUNT`, from SUITE_RUNNER_SHARD
    pub shard: Option<String>,
    /// From SUITE_RUNNER_FORMAT
    pub format: Option<String>,
    /// From SUITE_RUNNER_NO_COLOR
    pub no_color: Option<bool>,
    /// From SUITE_RUNNER_LOG
    pub log_level: Option<String>,
    /// From SUITE_RUNNER_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(format!("{ENV_PREFIX}_{name}").as_str());
        let get_bool = |name: &str| get(name).map(|v| parse_bool(&v));

        Self {
            concurrency: get("CONCURRENCY"),
            fail_fast: get_bool("FAIL_FAST"),
            max_concurrency: get("MAX_CONCURRENCY"),
            shard: get("SHARD"),
            format: get("FORMAT"),
            no_color: get_bool("NO_COLOR"),
            log_level: get("LOG"),
            config_file: get("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        *self != Self::default()
    }

    /// Apply the overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut RunnerConfig) -> Result<()> {
        let max_concurrency = self
            .max_concurrency
            .as_deref()
            .map(|v| {
                v.parse::<usize>()
                    .with_context(|| format!("Invalid {ENV_PREFIX}_MAX_CONCURRENCY: {v}"))
            })
            .transpose()?;

        match self.concurrency.as_deref().map(str::to_lowercase).as_deref() {
            Some("sequential") => {
                let fail_fast = self.fail_fast.unwrap_or(match config.strategy {
                    Strategy::Sequential { fail_fast } => fail_fast,
                    _ => true,
                });
                config.strategy = Strategy::sequential(fail_fast);
            }
            Some("parallel") => {
                let current = match config.strategy {
                    Strategy::Parallel { max_concurrency } => max_concurrency,
                    _ => None,
                };
                config.strategy = Strategy::Parallel {
                    max_concurrency: max_concurrency.or(current),
                };
            }
            Some(other) => bail!(
                "Invalid {ENV_PREFIX}_CONCURRENCY: {other} (expected sequential or parallel)"
            ),
            None => match &mut config.strategy {
                Strategy::Sequential { fail_fast } => {
                    if let Some(v) = self.fail_fast {
                        *fail_fast = v;
                    }
                }
                Strategy::Parallel {
                    max_concurrency: current,
                } => {
                    if max_concurrency.is_some() {
                        *current = max_concurrency;
                    }
                }
                Strategy::Sharded { .. } => {}
            },
        }

        if let Some(shard) = &self.shard {
            let shard: Shard = shard
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid {ENV_PREFIX}_SHARD"))?;
            config.strategy = shard.into();
        }

        if let Some(format) = &self.format {
            config.format = format
                .parse::<OutputFormat>()
                .map_err(|e| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid {ENV_PREFIX}_FORMAT"))?;
        }

        if let Some(no_color) = self.no_color {
            config.color = !no_color;
        }

        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }

        Ok(())
    }
}

/// Get environment variable as boolean
fn parse_bool(v: &str) -> bool {
    matches!(
        v.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
