//! CLI argument parsing
//!
//! Defines the command-line interface of a suite binary using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::RunnerConfig;
use crate::executor::{Shard, Strategy};
use crate::output::OutputFormat;

/// Run a test suite
#[derive(Parser, Debug, Default)]
#[command(name = "suite-runner")]
#[command(about = "Run a tree of async tests sequentially, in parallel or sharded")]
#[command(long_about = None)]
pub struct Args {
    /// Run tests concurrently
    #[arg(short, long, conflicts_with = "shard")]
    pub parallel: bool,

    /// Maximum number of tests in flight (with --parallel)
    #[arg(short = 'j', long, requires = "parallel")]
    pub max_concurrency: Option<usize>,

    /// Keep running after the first failure (sequential mode)
    #[arg(long, conflicts_with_all = ["parallel", "shard"])]
    pub no_fail_fast: bool,

    /// Run only one shard of the suite, zero-based
    #[arg(long, value_name = "INDEX/COUNT")]
    pub shard: Option<Shard>,

    /// Output format (pretty, json, json-pretty, csv)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the configuration
    pub fn apply(&self, config: &mut RunnerConfig) {
        if let Some(shard) = self.shard {
            config.strategy = shard.into();
        } else if self.parallel {
            config.strategy = Strategy::Parallel {
                max_concurrency: self.max_concurrency,
            };
        } else if self.no_fail_fast {
            config.strategy = Strategy::sequential(false);
        }

        if let Some(format) = self.format {
            config.format = format;
        }
        if self.no_color {
            config.color = false;
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
    }
}
