use super::OutputFormatter;
use crate::progress::format_bytes;
use anyhow::Result;
use colored::*;
use hashtab_core::{MatchState, TaskReport, TaskState};
use serde_json::{Map, Value, json};

fn display_path(report: &TaskReport) -> String {
    report
        .path
        .as_ref()
        .map_or_else(|| format!("<task {}>", report.id), |p| p.display().to_string())
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    use_color: bool,
}

impl TextFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn colorize(&self, text: &str, color: fn(&str) -> ColoredString) -> String {
        if self.use_color {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_single(&self, report: &TaskReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("File: {}\n", display_path(report)));
        output.push_str(&format!(
            "Size: {} ({})\n",
            format_bytes(report.size),
            report.size
        ));

        // Digests come in registry order
        for entry in &report.digests {
            let algo_str = self.colorize(entry.algorithm, |s| s.yellow());
            let hash_str = self.colorize(&hex::encode(&entry.digest), |s| s.cyan());
            output.push_str(&format!("  {algo_str}: {hash_str}\n"));
        }

        match report.state {
            TaskState::Cancelled => {
                output.push_str(&format!("  {}\n", self.colorize("Cancelled", |s| s.yellow())));
            }
            TaskState::Errored => {
                let message = report
                    .error
                    .as_ref()
                    .map_or_else(|| "unknown error".to_string(), ToString::to_string);
                output.push_str(&format!(
                    "  {}: {message}\n",
                    self.colorize("Error", |s| s.red())
                ));
            }
            _ => {}
        }

        match report.match_state {
            MatchState::NoExpectedHash => {}
            MatchState::AllMismatch => {
                output.push_str(&format!(
                    "  Match: {}\n",
                    self.colorize("MISMATCH", |s| s.red())
                ));
            }
            MatchState::MatchedAtAlgorithm(_) => {
                let algorithm = report.matched_algorithm.unwrap_or("unknown");
                output.push_str(&format!(
                    "  Match: {}\n",
                    self.colorize(&format!("OK ({algorithm})"), |s| s.green())
                ));
            }
        }

        Ok(output)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_value(report: &TaskReport) -> Result<Value> {
        let digests: Map<String, Value> = report
            .digests
            .iter()
            .map(|entry| (entry.algorithm.to_string(), json!(hex::encode(&entry.digest))))
            .collect();

        let matched = match report.match_state {
            MatchState::NoExpectedHash => Value::Null,
            MatchState::AllMismatch => json!(false),
            MatchState::MatchedAtAlgorithm(_) => json!(true),
        };

        Ok(json!({
            "path": report.path.as_ref().map(|p| p.to_string_lossy()),
            "size": report.size,
            "state": report.state,
            "error": serde_json::to_value(&report.error)?,
            "digests": digests,
            "matched": matched,
            "matched_algorithm": report.matched_algorithm,
        }))
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_single(&self, report: &TaskReport) -> Result<String> {
        let value = Self::to_value(report)?;
        if self.pretty {
            Ok(serde_json::to_string_pretty(&value)?)
        } else {
            Ok(serde_json::to_string(&value)?)
        }
    }

    fn format_batch(&self, reports: &[TaskReport]) -> Result<String> {
        let values = reports
            .iter()
            .map(Self::to_value)
            .collect::<Result<Vec<_>>>()?;

        if self.pretty {
            Ok(serde_json::to_string_pretty(&values)?)
        } else {
            Ok(serde_json::to_string(&values)?)
        }
    }
}

/// JSON Lines formatter, one compact object per file
pub struct JsonLinesFormatter;

impl Default for JsonLinesFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonLinesFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for JsonLinesFormatter {
    fn format_single(&self, report: &TaskReport) -> Result<String> {
        JsonFormatter::new(false).format_single(report)
    }
}
