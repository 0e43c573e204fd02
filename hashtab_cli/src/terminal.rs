//! Terminal detection
//!
//! Decisions about colors, progress bars and the run summary are taken from a
//! [`Terminal`] snapshot so they can be tested without a real TTY.

use is_terminal::IsTerminal;
use std::env;
use std::io::{stderr, stdout};

/// Environment variables set by common CI systems
const CI_VARS: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "JENKINS_URL",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "TRAVIS",
    "CIRCLECI",
    "BUILDKITE",
    "DRONE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

/// What the process knows about where its output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub stdout_tty: bool,
    pub stderr_tty: bool,
    pub ci: bool,
    pub term: Option<String>,
    pub no_color: bool,
}

impl Terminal {
    /// Snapshot the current process
    pub fn detect() -> Self {
        Self {
            stdout_tty: stdout().is_terminal(),
            stderr_tty: stderr().is_terminal(),
            ci: CI_VARS.iter().any(|var| env::var_os(var).is_some())
                || env::var("DEBIAN_FRONTEND").is_ok_and(|v| v == "noninteractive"),
            term: env::var("TERM").ok(),
            no_color: env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()),
        }
    }

    /// A person is reading stdout
    pub fn is_interactive(&self) -> bool {
        self.stdout_tty && !self.ci
    }

    /// Escape sequences will be rendered rather than printed
    pub fn supports_ansi(&self) -> bool {
        if !self.is_interactive() {
            return false;
        }
        // Windows consoles leave TERM unset but render ANSI since Windows 10
        match self.term.as_deref() {
            Some("dumb") => false,
            None | Some("") => cfg!(windows),
            Some(_) => true,
        }
    }

    /// The progress bar goes to stderr and must not interleave with piped results
    pub fn show_progress(&self) -> bool {
        self.supports_ansi() && self.stderr_tty
    }

    pub fn use_color(&self, configured: bool) -> bool {
        configured && !self.no_color && self.supports_ansi()
    }
}

/// Check if stdout is connected to an interactive terminal
pub fn is_interactive() -> bool {
    Terminal::detect().is_interactive()
}

/// Determine if progress bars should be shown by default
pub fn should_show_progress_by_default() -> bool {
    Terminal::detect().show_progress()
}

/// Whether colored output should be used
pub fn use_color(configured: bool) -> bool {
    Terminal::detect().use_color(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tty() -> Terminal {
        Terminal {
            stdout_tty: true,
            stderr_tty: true,
            ci: false,
            term: Some("xterm-256color".to_string()),
            no_color: false,
        }
    }

    #[test]
    fn test_interactive_terminal() {
        let terminal = tty();
        assert!(terminal.is_interactive());
        assert!(terminal.supports_ansi());
        assert!(terminal.show_progress());
        assert!(terminal.use_color(true));
        assert!(!terminal.use_color(false));
    }

    #[test]
    fn test_piped_stdout() {
        let terminal = Terminal {
            stdout_tty: false,
            ..tty()
        };
        assert!(!terminal.is_interactive());
        assert!(!terminal.show_progress());
        assert!(!terminal.use_color(true));
    }

    #[test]
    fn test_ci_is_not_interactive() {
        let terminal = Terminal { ci: true, ..tty() };
        assert!(!terminal.is_interactive());
    }

    #[test]
    fn test_dumb_terminal() {
        let terminal = Terminal {
            term: Some("dumb".to_string()),
            ..tty()
        };
        assert!(terminal.is_interactive());
        assert!(!terminal.supports_ansi());
        assert!(!terminal.show_progress());
    }

    #[test]
    fn test_redirected_stderr_hides_progress() {
        let terminal = Terminal {
            stderr_tty: false,
            ..tty()
        };
        assert!(terminal.use_color(true));
        assert!(!terminal.show_progress());
    }

    #[test]
    fn test_no_color() {
        let terminal = Terminal {
            no_color: true,
            ..tty()
        };
        assert!(!terminal.use_color(true));
        assert!(terminal.show_progress());
    }

    #[test]
    fn test_detect_does_not_panic() {
        let _ = Terminal::detect();
        let _ = should_show_progress_by_default();
    }
}
