//! User-facing diagnostic messages.
//!
//! Resolution problems are collected rather than raised, then printed as one
//! line each so that a single run reports everything that is wrong.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when resolution failed but the user may still want a Makefile.
    pub const KEEP_GOING: &str = "help: Pass `--keep-going` to generate a Makefile anyway";

    /// Suggestion when a variable has no value.
    pub const SUPPLY_VARIABLE: &str =
        "help: Pass NAME=VALUE on the command line or run with `--prompt`";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            suggestions: Vec::new(),
        }
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic as a single line for terminal output.
    ///
    /// Suggestions are only shown in verbose mode, each on its own line.
    pub fn format(&self, color: bool, verbose: bool) -> String {
        let severity_str = if color {
            match self.severity {
                Severity::Error => format!("\x1b[1;31m{}\x1b[0m", self.severity),
                Severity::Warning => format!("\x1b[1;33m{}\x1b[0m", self.severity),
            }
        } else {
            self.severity.to_string()
        };

        let mut output = format!("{}: {}\n", severity_str, self.message);

        if verbose {
            for suggestion in &self.suggestions {
                output.push_str(&format!("  {}\n", suggestion));
            }
        }

        output
    }
}

/// Terminal error raised when any resolution step failed.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("dependency resolution failed, aborting")]
#[diagnostic(
    code(coqconf::resolve::failed),
    help("Pass `--keep-going` to generate a Makefile anyway")
)]
pub struct ResolutionFailed {
    /// Number of failing diagnostics in the run
    pub failures: usize,
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool, verbose: bool) {
    eprint!("{}", diagnostic.format(color, verbose));
}
