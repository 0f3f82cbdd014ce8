use crate::errors::Result;
use crate::replacer::{FileOutcome, OutputPolicy};
use crate::rules::RuleSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Defines the possible formats for the end-of-run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// A simple, human-readable text summary.
    #[default]
    Text,
    /// JSON format, suitable for machine processing.
    Json,
    /// No report.
    None,
}

/// A target that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub target: String,
    pub message: String,
}

/// Counters and diagnostics collected over one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started: DateTime<Utc>,
    pub files_processed: usize,
    pub files_written: usize,
    pub lines_printed: usize,
    pub strings_processed: usize,
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started: Utc::now(),
            files_processed: 0,
            files_written: 0,
            lines_printed: 0,
            strings_processed: 0,
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        self.files_processed += 1;
        match outcome {
            FileOutcome::Written(_) | FileOutcome::Replaced(_) => self.files_written += 1,
            FileOutcome::Printed(lines) => self.lines_printed += lines,
        }
    }

    pub fn fail(&mut self, target: &Path, error: impl ToString) {
        self.failures.push(Failure {
            target: target.display().to_string(),
            message: error.to_string(),
        });
    }

    pub fn warn(&mut self, warning: impl ToString) {
        self.warnings.push(warning.to_string());
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Describes what a run is about to do: the rules in order and where the
/// output goes.
pub fn format_plan(rules: &RuleSet, policy: OutputPolicy) -> String {
    let mut output = String::new();
    if !rules.is_empty() {
        output.push_str("Set to perform these changes:\n");
        for (pattern, replacement) in rules.pairs() {
            let _ = writeln!(output, "  '{pattern}' -> '{replacement}'");
        }
    }
    output.push_str(match policy {
        OutputPolicy::ReplaceOriginal => "Original files will be replaced.",
        OutputPolicy::WriteNew => "New files will be created.",
        OutputPolicy::Print => "Results will be printed.",
    });
    output
}

/// Writes the summary of a run in the requested format.
pub fn write_report<W: Write>(
    writer: &mut W,
    summary: &RunSummary,
    format: ReportFormat,
) -> Result<()> {
    let output = match format {
        ReportFormat::Text => format_text(summary),
        ReportFormat::Json => format_json(summary)?,
        ReportFormat::None => return Ok(()),
    };
    writer.write_all(output.as_bytes())?;
    Ok(())
}

fn format_text(summary: &RunSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", "-".repeat(50)));
    output.push_str(&format!("Files processed : {}\n", summary.files_processed));
    output.push_str(&format!("Files written   : {}\n", summary.files_written));
    if summary.strings_processed > 0 {
        output.push_str(&format!("Strings         : {}\n", summary.strings_processed));
    }
    output.push_str(&format!("Failures        : {}\n", summary.failures.len()));
    for f in &summary.failures {
        output.push_str(&format!("  {}: {}\n", f.target, f.message));
    }
    if !summary.warnings.is_empty() {
        output.push_str(&format!("Warnings        : {}\n", summary.warnings.len()));
        for w in &summary.warnings {
            output.push_str(&format!("  {w}\n"));
        }
    }
    output
}

fn format_json(summary: &RunSummary) -> Result<String> {
    #[derive(Serialize)]
    struct JsonOutput<'a> {
        tool: ToolInfo,
        #[serde(flatten)]
        summary: &'a RunSummary,
    }

    #[derive(Serialize)]
    struct ToolInfo {
        name: String,
        version: String,
    }

    let output = JsonOutput {
        tool: ToolInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        summary,
    };
    let mut json = serde_json::to_string_pretty(&output)?;
    json.push('\n');
    Ok(json)
}
