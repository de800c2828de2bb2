//! Implementation of `coqconf`: resolve, then emit a Makefile.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::makefile::{write_makefile, MakefileOptions};
use crate::core::variables::Environment;
use crate::resolver::{resolve, ProjectLocation, Report, Resolution};
use crate::util::diagnostic::Diagnostic;

/// Warning shown when a Makefile is generated despite failures.
pub const KEEP_GOING_WARNING: &str =
    "dependency resolution failed, but continuing anyway as you requested";

/// Options for a configure run.
#[derive(Debug, Clone)]
pub struct ConfigureOptions {
    /// The project to configure
    pub location: ProjectLocation,

    /// Emit the Makefile even if resolution failed
    pub keep_going: bool,

    /// Print the resolution as JSON instead of writing a Makefile
    pub emit_plan: bool,

    /// Where to write the Makefile
    pub makefile: PathBuf,

    /// Makefile contents settings
    pub makefile_opts: MakefileOptions,
}

/// What a configure run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The Makefile was written to this path
    Emitted(PathBuf),
    /// The resolution, serialized as JSON
    Planned(String),
    /// Resolution failed and nothing was written
    Aborted,
}

/// The result of a configure run.
#[derive(Debug)]
pub struct ConfigureResult {
    pub resolution: Resolution,
    pub report: Report,
    pub outcome: Outcome,
}

/// Resolve a project and emit its Makefile.
///
/// Resolution problems never make this return an error; they are collected in
/// the report, and if any of them is a failure the outcome is
/// [`Outcome::Aborted`] unless `keep_going` is set. Every problem is passed to
/// `on_diagnostic` before anything is written, so they are shown even when
/// writing the output fails, which is the only case that returns an error.
pub fn configure(
    opts: &ConfigureOptions,
    env: &mut Environment,
    mut on_diagnostic: impl FnMut(&Diagnostic),
) -> Result<ConfigureResult> {
    let mut report = Report::new();
    let resolution = resolve(&opts.location, env, &mut report);

    for diagnostic in report.diagnostics() {
        on_diagnostic(&diagnostic);
    }

    if report.failed() {
        if !opts.keep_going {
            tracing::debug!("{} failures, not emitting", report.failure_count());
            return Ok(ConfigureResult {
                resolution,
                report,
                outcome: Outcome::Aborted,
            });
        }
        on_diagnostic(&Diagnostic::warning(KEEP_GOING_WARNING));
    }

    let outcome = if opts.emit_plan {
        let json = serde_json::to_string_pretty(&resolution)
            .context("failed to serialize resolution")?;
        Outcome::Planned(json)
    } else {
        write_makefile(&opts.makefile, &resolution, &opts.makefile_opts)?;
        Outcome::Emitted(opts.makefile.clone())
    };

    Ok(ConfigureResult {
        resolution,
        report,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn run(opts: &ConfigureOptions) -> (Result<ConfigureResult>, Vec<String>) {
        let mut env = Environment::new(BTreeMap::new());
        let mut messages = Vec::new();
        let result = configure(opts, &mut env, |d| messages.push(d.message.clone()));
        (result, messages)
    }

    fn options(root: &Path) -> ConfigureOptions {
        ConfigureOptions {
            location: ProjectLocation::new(Some(root.to_path_buf())),
            keep_going: false,
            emit_plan: false,
            makefile: root.join("Makefile"),
            makefile_opts: MakefileOptions::default(),
        }
    }

    fn project_with_two_bad_imports(root: &Path) {
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/A.v"), "Require Import Nope.One.\n").unwrap();
        fs::write(root.join("src/B.v"), "Require Import Nope.Two.\n").unwrap();
    }

    #[test]
    fn test_failures_abort_once() {
        let tmp = TempDir::new().unwrap();
        project_with_two_bad_imports(tmp.path());

        let (result, messages) = run(&options(tmp.path()));
        let result = result.unwrap();

        assert_eq!(result.outcome, Outcome::Aborted);
        assert_eq!(result.report.failure_count(), 2);
        // Missing registry warning plus one line per failed import.
        assert_eq!(messages.len(), 3);
        assert!(!messages.iter().any(|m| m == KEEP_GOING_WARNING));
        assert!(!tmp.path().join("Makefile").exists());
    }

    #[test]
    fn test_keep_going_emits() {
        let tmp = TempDir::new().unwrap();
        project_with_two_bad_imports(tmp.path());
        let opts = ConfigureOptions {
            keep_going: true,
            ..options(tmp.path())
        };

        let (result, messages) = run(&opts);
        let result = result.unwrap();

        assert_eq!(messages.last().map(String::as_str), Some(KEEP_GOING_WARNING));
        assert_eq!(messages.len(), 4);

        assert_eq!(result.outcome, Outcome::Emitted(tmp.path().join("Makefile")));
        assert!(result.report.failed());
        let makefile = fs::read_to_string(tmp.path().join("Makefile")).unwrap();
        assert!(makefile.contains(&format!(
            "{}: {}",
            tmp.path().join("bin/A.vo").display(),
            tmp.path().join("src/A.v").display()
        )));
    }

    #[test]
    fn test_plan_outputs_json() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/A.v"), "").unwrap();
        let opts = ConfigureOptions {
            emit_plan: true,
            ..options(tmp.path())
        };

        let (result, _) = run(&opts);
        let result = result.unwrap();

        let Outcome::Planned(json) = result.outcome else {
            panic!("expected a plan");
        };
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["load_path"].as_array().unwrap().len(), 2);
        assert_eq!(value["config"]["directives"][0]["kind"], "SourceLoadPath");
        assert!(!tmp.path().join("Makefile").exists());
    }

    #[test]
    fn test_diagnostics_delivered_before_write_error() {
        let tmp = TempDir::new().unwrap();
        project_with_two_bad_imports(tmp.path());
        let opts = ConfigureOptions {
            keep_going: true,
            makefile: tmp.path().join("missing-dir/Makefile"),
            ..options(tmp.path())
        };

        let (result, messages) = run(&opts);

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("failed to create"));
        assert!(messages.iter().any(|m| m.contains("Nope.One")));
        assert_eq!(messages.last().map(String::as_str), Some(KEEP_GOING_WARNING));
    }
}
