//! Suite entry point
//!
//! Glues configuration, execution, reporting and the process exit status
//! together for a suite binary:
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     suite_runner::run_main(my_suite())
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

use crate::cli::Args;
use crate::config::{EnvConfig, RunnerConfig};
use crate::executor::run_tests;
use crate::models::{SuiteResult, TestUnit};
use crate::output::ResultFormatter;
use crate::utils::{init_logger, LogLevel};

/// Exit status when the suite could not be run at all
pub const CONFIG_ERROR_EXIT: u8 = 2;

/// Map a suite result to a process exit status
pub fn exit_code(result: &SuiteResult) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Configured runner that prints its report to stdout
pub struct Harness {
    config: RunnerConfig,
}

impl Harness {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Resolve configuration from file, environment and command line
    pub fn from_args(args: &Args) -> Result<Self> {
        let env = EnvConfig::load();
        let config_path = args
            .config
            .clone()
            .or_else(|| env.config_file.clone().map(Into::into));

        let mut config = match config_path {
            Some(path) => RunnerConfig::load(path)?,
            None => RunnerConfig::load_default()?,
        };
        env.apply(&mut config)
            .context("Invalid environment configuration")?;
        args.apply(&mut config);

        Ok(Self { config })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn formatter(&self) -> ResultFormatter {
        let formatter = ResultFormatter::new(self.config.format);
        if self.config.color {
            formatter
        } else {
            formatter.no_color()
        }
    }

    /// Render the report for a finished suite
    pub fn report(&self, result: &SuiteResult) -> Result<String> {
        self.formatter().format_result(result)
    }

    /// Run the suite and print its report
    pub async fn run(&self, units: &[TestUnit]) -> Result<SuiteResult> {
        debug!("Running with {:?}", self.config);
        let result = run_tests(units, self.config.strategy).await;
        println!("{}", self.report(&result)?);
        Ok(result)
    }
}

/// Parse the command line, run the suite and return the exit status
pub fn run_main(units: Vec<TestUnit>) -> ExitCode {
    run_main_with_args(Args::parse(), units)
}

/// Like [`run_main`] with already-parsed arguments
pub fn run_main_with_args(args: Args, units: Vec<TestUnit>) -> ExitCode {
    match try_run(&args, &units) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(CONFIG_ERROR_EXIT)
        }
    }
}

fn try_run(args: &Args, units: &[TestUnit]) -> Result<u8> {
    let harness = Harness::from_args(args)?;

    let level: LogLevel = harness
        .config()
        .log_level
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    init_logger(level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;
    let result = runtime.block_on(harness.run(units))?;

    Ok(exit_code(&result))
}
