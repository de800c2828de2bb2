//! coqconf CLI - generate a Makefile for a Coq project

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use coqconf::builder::{LoadPathFlags, MakefileOptions};
use coqconf::core::variables::{stdin_prompter, Environment, NoPrompt, Prompter};
use coqconf::ops::{configure, ConfigureOptions, Outcome};
use coqconf::resolver::ProjectLocation;
use coqconf::util::config::{global_config_path, load_config, project_config_path};
use coqconf::util::diagnostic::{self, Diagnostic, ResolutionFailed};

fn main() {
    if let Err(e) = run() {
        let color = std::io::stderr().is_terminal();
        diagnostic::emit(&Diagnostic::error(format!("{:#}", e)), color, false);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("coqconf=debug")
    } else {
        EnvFilter::new("coqconf=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let location = ProjectLocation::new(cli.project_dir.clone());
    let project_dir = location.dir();

    // Load configuration (global + project); CLI values win
    let config = load_config(
        global_config_path().as_deref(),
        &project_config_path(&project_dir),
    );

    let mut values = config.variables.clone();
    values.extend(cli.vars);

    let prompter: Box<dyn Prompter> = if cli.prompt || config.build.prompt {
        Box::new(stdin_prompter())
    } else {
        Box::new(NoPrompt)
    };
    let mut env = Environment::with_prompter(values, prompter);

    let flags = if cli.use_q || config.build.use_q {
        LoadPathFlags::Qualified
    } else {
        LoadPathFlags::IncludeAs
    };

    let opts = ConfigureOptions {
        keep_going: cli.keep_going || config.build.keep_going,
        emit_plan: cli.plan,
        makefile: cli
            .output
            .unwrap_or_else(|| project_dir.join(config.makefile())),
        makefile_opts: MakefileOptions {
            flags,
            coqc: config.coqc().to_string(),
            coqflags: config.coqflags().to_string(),
            project: project_dir.display().to_string(),
            ..MakefileOptions::default()
        },
        location,
    };

    let color = std::io::stderr().is_terminal();
    let result = configure(&opts, &mut env, |diag| {
        diagnostic::emit(diag, color, cli.verbose)
    })?;

    match result.outcome {
        Outcome::Aborted => Err(ResolutionFailed {
            failures: result.report.failure_count(),
        }
        .into()),
        Outcome::Planned(json) => {
            println!("{}", json);
            Ok(())
        }
        Outcome::Emitted(path) => {
            tracing::info!("Generated {}", path.display());
            Ok(())
        }
    }
}
