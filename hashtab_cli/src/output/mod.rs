//! Rendering of task reports

mod formatters;

pub use formatters::{JsonFormatter, JsonLinesFormatter, TextFormatter};

use anyhow::Result;
use hashtab_core::TaskReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Text,
    Json,
    JsonLines,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-lines" | "jsonl" => Ok(Self::JsonLines),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::JsonLines => "json-lines",
        })
    }
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Format a single report
    fn format_single(&self, report: &TaskReport) -> Result<String>;

    /// Format a batch of reports
    fn format_batch(&self, reports: &[TaskReport]) -> Result<String> {
        let formatted: Result<Vec<String>> =
            reports.iter().map(|r| self.format_single(r)).collect();

        Ok(formatted?.join("\n"))
    }
}

/// Create a formatter based on output format
pub fn create_formatter(format: OutputFormat, use_color: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(use_color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::JsonLines => Box::new(JsonLinesFormatter::new()),
    }
}
