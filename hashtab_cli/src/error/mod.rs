//! Exit codes and user-facing error rendering

use colored::*;
use hashtab_core::error::ValidationError;
use hashtab_core::{AlgorithmRegistry, MatchState, TaskReport, TaskState};
use std::error::Error as StdError;

/// Semantic exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Every file hashed, and matched when expectations were given
    Success = 0,
    /// Every file hashed, but at least one did not match
    Mismatch = 1,
    /// A file failed or was cancelled, or the command itself failed
    Failure = 2,
}

impl ExitCode {
    /// Worst outcome across all reports; failures outrank mismatches
    pub fn for_reports(reports: &[TaskReport]) -> Self {
        let failed = reports.iter().any(|r| r.state != TaskState::Done);
        let mismatched = reports
            .iter()
            .any(|r| r.match_state == MatchState::AllMismatch);

        if failed {
            Self::Failure
        } else if mismatched {
            Self::Mismatch
        } else {
            Self::Success
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Render a fatal error with its cause chain and recovery hints
pub fn format_for_user(error: &anyhow::Error, debug: bool) -> String {
    let mut output = format!("{}: {error}\n", "Error".red());

    let mut causes = error.chain().skip(1).peekable();
    if causes.peek().is_some() {
        output.push_str("\nCaused by:\n");
        for (level, cause) in causes.enumerate() {
            output.push_str(&format!("  {}: {cause}\n", level + 1));
            if !debug {
                break;
            }
        }
    }

    let suggestions = suggestions(error);
    if !suggestions.is_empty() {
        output.push_str("\nSuggestions:\n");
        for suggestion in suggestions {
            output.push_str(&format!("  - {suggestion}\n"));
        }
    }

    output
}

/// Recovery hints derived from the error chain
pub fn suggestions(error: &anyhow::Error) -> Vec<String> {
    let mut suggestions = Vec::new();

    for cause in error.chain() {
        if let Some(validation) = find_validation(cause) {
            match validation {
                ValidationError::UnknownAlgorithm { name } => {
                    if let Some(close) = closest_algorithm(name) {
                        suggestions.push(format!("Did you mean '{close}'?"));
                    }
                    suggestions.push("Run 'hashtab algorithms' to list supported algorithms".to_string());
                }
                ValidationError::InvalidParameter { .. } => {
                    suggestions.push(
                        "Only extendable-output algorithms accept ':bits', in multiples of 8"
                            .to_string(),
                    );
                }
                ValidationError::InvalidConfiguration { .. } => {
                    suggestions.push("Check 'hashtab config show' for the effective values".to_string());
                }
                ValidationError::AlreadyStarted { .. } => {}
            }
        }

        if let Some(io) = cause.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::PermissionDenied
        {
            suggestions.push("Check file permissions".to_string());
        }
    }

    suggestions.dedup();
    suggestions
}

fn find_validation<'a>(cause: &'a (dyn StdError + 'static)) -> Option<&'a ValidationError> {
    if let Some(validation) = cause.downcast_ref::<ValidationError>() {
        return Some(validation);
    }
    match cause.downcast_ref::<hashtab_core::Error>()? {
        hashtab_core::Error::Validation(validation) => Some(validation),
        _ => None,
    }
}

/// Registry id within edit distance 2 of `name`
fn closest_algorithm(name: &str) -> Option<&'static str> {
    let name = name.to_ascii_lowercase();
    AlgorithmRegistry::global()
        .list()
        .map(|algorithm| (levenshtein_distance(&name, algorithm.id()), algorithm.id()))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, id)| id)
}

/// Simple Levenshtein distance for suggestions
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();
    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(len1 + 1) {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate().take(len2 + 1) {
        *cell = j;
    }

    for (i, c1) in s1_chars.iter().enumerate() {
        let i1 = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let j1 = j + 1;
            let cost = if c1 == c2 { 0 } else { 1 };
            matrix[i1][j1] = std::cmp::min(
                std::cmp::min(matrix[i][j1] + 1, matrix[i1][j] + 1),
                matrix[i][j] + cost,
            );
        }
    }

    matrix[len1][len2]
}
