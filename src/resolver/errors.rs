//! Resolution error types and diagnostics.
//!
//! None of these abort a run on their own. They are collected in a
//! [`Report`] so that every problem is shown together, and the caller decides
//! once at the end whether the run failed.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A problem found while resolving a project.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("the \"{}\" file is missing, empty, or unreadable; non-trivial dependency resolution may fail", .path.display())]
    MissingFile { path: PathBuf },

    #[error("{}: ignoring malformed input: {reason}", location(.path, *.line))]
    MalformedLine {
        path: PathBuf,
        line: Option<usize>,
        reason: String,
    },

    #[error("the library \"{library}\" ({variable}) could not be found; dependencies on it will not be resolved correctly")]
    UnresolvedExternalPath { library: String, variable: String },

    #[error("the variable {variable} is not defined; dependencies on {} will not be resolved correctly", .libraries.as_deref().unwrap_or("it"))]
    UnresolvedVariable {
        variable: String,
        libraries: Option<String>,
    },

    #[error("the project \"{project}\" could not be found; dependencies on it will not be resolved correctly{}", hint_text(.project_var, *.hint))]
    UnresolvedSubProject {
        project: String,
        project_var: String,
        hint: bool,
    },

    #[error("the project \"{project}\" includes itself through {}", .chain.join(" -> "))]
    CyclicProject { project: String, chain: Vec<String> },

    #[error("{}: couldn't resolve dependency \"{identifier}\"", .source_file.display())]
    UnresolvedImport {
        source_file: PathBuf,
        identifier: String,
    },

    #[error("couldn't find directory \"{}\"", .directory.display())]
    MissingDirectory { directory: PathBuf },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn location(path: &std::path::Path, line: Option<usize>) -> String {
    match line {
        Some(line) => format!("{}:{}", path.display(), line),
        None => path.display().to_string(),
    }
}

fn hint_text(project_var: &str, hint: bool) -> String {
    if hint {
        format!(
            " (either specify its path with the {} variable or specify the path to its parent directory with the WORKSPACE variable)",
            project_var
        )
    } else {
        String::new()
    }
}

impl ResolveError {
    /// Whether this problem makes the run fail.
    ///
    /// Missing optional files, malformed lines and missing directories are
    /// only warnings.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            ResolveError::MissingFile { .. }
                | ResolveError::MalformedLine { .. }
                | ResolveError::MissingDirectory { .. }
        )
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::warning(self.to_string());
        match self {
            ResolveError::UnresolvedVariable { .. }
            | ResolveError::UnresolvedExternalPath { .. } => {
                diag.with_suggestion(suggestions::SUPPLY_VARIABLE)
            }
            ResolveError::UnresolvedImport { .. } | ResolveError::CyclicProject { .. } => {
                diag.with_suggestion(suggestions::KEEP_GOING)
            }
            _ => diag,
        }
    }
}

/// Accumulated outcome of one or more resolution steps.
#[derive(Debug, Default)]
pub struct Report {
    issues: Vec<ResolveError>,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    /// Record a problem.
    pub fn push(&mut self, issue: ResolveError) {
        tracing::debug!("{}", issue);
        self.issues.push(issue);
    }

    /// Append every problem from another report.
    pub fn merge(&mut self, other: Report) {
        self.issues.extend(other.issues);
    }

    /// Whether any recorded problem makes the run fail.
    pub fn failed(&self) -> bool {
        self.issues.iter().any(ResolveError::is_failure)
    }

    /// Number of recorded problems that make the run fail.
    pub fn failure_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_failure()).count()
    }

    pub fn issues(&self) -> &[ResolveError] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// All problems as diagnostics, in the order they were found.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.issues.iter().map(ResolveError::to_diagnostic).collect()
    }
}
