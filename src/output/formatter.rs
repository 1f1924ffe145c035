//! Output formatters for suite results
//!
//! Provides pretty, JSON and CSV renderings of a [`SuiteResult`], plus the
//! error-details block printed when a suite fails.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{
    flatten, AssertionReport, SuiteError, SuiteResult, SuiteSummary, TestError, TestOutcome,
    UnitOutcome,
};

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    JsonPretty,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "table" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!(
                "unknown output format '{other}' (expected pretty, json, json-pretty or csv)"
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonPretty => write!(f, "json-pretty"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

const GREEN: &str = "32";
const RED: &str = "31";
const GRAY: &str = "2;90";
const ERROR_BADGE: &str = "1;7;31";

/// JSON document written for machine-readable output
#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    success: bool,
    summary: SuiteSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<&'a [UnitOutcome]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a SuiteError>,
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render a whole suite result in the configured format
    pub fn format_result(&self, result: &SuiteResult) -> Result<String> {
        match self.format {
            OutputFormat::Pretty => Ok(self.format_pretty(result)),
            OutputFormat::Json | OutputFormat::JsonPretty => self.format_json(result),
            OutputFormat::Csv => self.format_csv(result),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.colorize {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn passed(&self, name: &str) -> String {
        format!("{} {name}", self.paint(GREEN, "✓"))
    }

    fn failed(&self, name: &str) -> String {
        format!("{} {name}", self.paint(RED, "×"))
    }

    fn skipped(&self, name: &str) -> String {
        format!("{} {name}", self.paint(GRAY, "↓"))
    }

    fn pad(depth: usize) -> String {
        "  ".repeat(depth + 1)
    }

    /// One line per unit, indented by depth; multi-assertion failures expanded
    pub fn format_tree(&self, outcomes: &[UnitOutcome]) -> Vec<String> {
        let mut lines = Vec::new();
        self.push_units(outcomes, 0, &mut lines);
        lines
    }

    fn push_units(&self, outcomes: &[UnitOutcome], depth: usize, lines: &mut Vec<String>) {
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Test(test) => self.push_test(test, depth, lines),
                UnitOutcome::Group(group) => {
                    let header = if outcome.is_pass() {
                        self.passed(&group.name)
                    } else {
                        self.failed(&group.name)
                    };
                    lines.push(format!("{}{header}", Self::pad(depth)));
                    self.push_units(&group.results, depth + 1, lines);
                }
            }
        }
    }

    fn push_test(&self, test: &TestOutcome, depth: usize, lines: &mut Vec<String>) {
        let pad = Self::pad(depth);
        match test.error() {
            None => lines.push(format!("{pad}{}", self.passed(test.name()))),
            Some(TestError::Skipped) => lines.push(format!("{pad}{}", self.skipped(test.name()))),
            Some(TestError::MultipleAssertionFailed { results }) => {
                lines.push(format!("{pad}{}", self.failed(test.name())));
                lines.extend(self.assertion_lines(results, depth + 1));
            }
            Some(TestError::AssertionFailed(_)) => {
                lines.push(format!("{pad}{}", self.failed(test.name())))
            }
        }
    }

    fn assertion_lines(&self, results: &[AssertionReport], depth: usize) -> Vec<String> {
        let pad = Self::pad(depth);
        results
            .iter()
            .map(|report| match report.result {
                Ok(()) => format!("{pad}{}", self.passed(&report.name)),
                Err(_) => format!("{pad}{}", self.failed(&report.name)),
            })
            .collect()
    }

    /// Detail lines for a failing suite, headed by the error kind
    pub fn format_error_details(&self, error: &SuiteError) -> Vec<String> {
        let content = match error {
            SuiteError::TestError { results } => test_error_lines(results),
            SuiteError::DuplicateTestName { name } => vec![format!(" Test name: {name}")],
            SuiteError::ShardingError { value } => vec![format!(" {value}")],
        };

        let mut lines = vec![format!(
            "{} {}",
            self.paint(ERROR_BADGE, " ERROR "),
            error.kind()
        )];
        lines.extend(content.into_iter().map(|line| format!("  {line}")));
        lines
    }

    fn format_pretty(&self, result: &SuiteResult) -> String {
        let mut lines = match result {
            Ok(outcomes) => self.format_tree(outcomes),
            Err(e) => e.results().map(|r| self.format_tree(r)).unwrap_or_default(),
        };

        lines.push(String::new());
        lines.push(SuiteSummary::from_result(result).to_string());

        if let Err(e) = result {
            lines.push(String::new());
            lines.extend(self.format_error_details(e));
        }

        lines.join("\n")
    }

    fn format_json(&self, result: &SuiteResult) -> Result<String> {
        let report = JsonReport {
            generated_at: Utc::now(),
            success: result.is_ok(),
            summary: SuiteSummary::from_result(result),
            results: match result {
                Ok(outcomes) => Some(outcomes.as_slice()),
                Err(e) => e.results(),
            },
            error: result.as_ref().err(),
        };

        if self.format == OutputFormat::JsonPretty {
            serde_json::to_string_pretty(&report).context("Failed to serialize report")
        } else {
            serde_json::to_string(&report).context("Failed to serialize report")
        }
    }

    fn format_csv(&self, result: &SuiteResult) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["test_name", "status", "duration_ms", "error"])?;

        let outcomes = match result {
            Ok(outcomes) => outcomes.as_slice(),
            Err(e) => e.results().unwrap_or_default(),
        };
        for entry in flatten(outcomes) {
            let (status, duration, error) = match entry.outcome {
                TestOutcome::Pass { elapsed, .. } => {
                    ("pass", elapsed.as_millis().to_string(), String::new())
                }
                TestOutcome::Fail {
                    error: TestError::Skipped,
                    ..
                } => ("skip", String::new(), String::new()),
                TestOutcome::Fail { error, .. } => ("fail", String::new(), error.to_string()),
            };
            writer.write_record([
                entry.full_name().as_str(),
                status,
                duration.as_str(),
                error.as_str(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }
}

fn test_error_lines(results: &[UnitOutcome]) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in flatten(results) {
        let Some(error) = entry.outcome.error() else {
            continue;
        };
        match error {
            TestError::Skipped => {}
            TestError::AssertionFailed(e) => {
                lines.push(format!(" {}", entry.full_name()));
                lines.push(format!("   {}: {e}", e.code()));
            }
            TestError::MultipleAssertionFailed { results } => {
                lines.push(format!(" {}", entry.full_name()));
                for report in results {
                    if let Err(e) = &report.result {
                        lines.push(format!("   {}: {}: {e}", report.name, e.code()));
                    }
                }
            }
        }
    }
    lines
}
