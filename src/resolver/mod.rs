//! Load path and dependency resolution.
//!
//! Resolution runs in a fixed order:
//!
//! 1. load `_CoqProject` and the variable registry, substituting variables
//! 2. discover source files, creating their output directories
//! 3. expand the load path, recursing into referenced projects
//! 4. resolve each source file's imports against the load path
//!
//! Problems never stop the pipeline; they are collected in a [`Report`].

pub mod deps;
pub mod errors;
pub mod load_path;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::project::ProjectConfig;
use crate::core::registry::Registry;
use crate::core::variables::{substitute_variables, Environment, ResolvedLibraries};

pub use deps::{BuildTarget, DependencyGraph};
pub use errors::{Report, ResolveError};
pub use load_path::{LoadPathEntry, LoadPathExpander};

/// A project configuration together with its substituted libraries.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub config: ProjectConfig,
    pub libraries: ResolvedLibraries,
    /// Whether the registry had any records
    pub has_registry: bool,
}

/// Load a project's configuration and registry.
///
/// `root` of `None` keeps the paths of the project file relative.
pub fn load_project(
    root: Option<&Path>,
    project_file: &Path,
    vars_file: &Path,
    env: &mut Environment,
    report: &mut Report,
) -> LoadedProject {
    let config = ProjectConfig::load(root, project_file, env, report);
    let registry = Registry::load(vars_file, report);
    let libraries = substitute_variables(&registry.structure(), env, report);
    LoadedProject {
        config,
        libraries,
        has_registry: !registry.is_empty(),
    }
}

/// Where to find a project's files.
#[derive(Debug, Clone)]
pub struct ProjectLocation {
    /// Project root; `None` resolves relative to the working directory
    pub root: Option<PathBuf>,
    pub project_file: PathBuf,
    pub vars_file: PathBuf,
}

impl ProjectLocation {
    /// The standard files inside `root`.
    pub fn new(root: Option<PathBuf>) -> Self {
        let base = root.clone().unwrap_or_default();
        ProjectLocation {
            project_file: base.join(crate::core::project::PROJECT_FILE),
            vars_file: base.join(crate::core::registry::VARS_FILE),
            root,
        }
    }

    /// The directory the project lives in.
    pub fn dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// The complete result of resolving a project.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub config: ProjectConfig,
    /// Expanded load path in search order, duplicates included
    pub load_path: Vec<LoadPathEntry>,
    /// `(source, output)` directory pairs
    pub source_dirs: Vec<(PathBuf, PathBuf)>,
    /// Artifact to prerequisites
    pub deps: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl Resolution {
    /// The load path without repeated entries.
    pub fn unique_load_path(&self) -> Vec<LoadPathEntry> {
        load_path::dedup_entries(&self.load_path)
    }
}

/// Resolve a project's load path and dependency graph.
pub fn resolve(location: &ProjectLocation, env: &mut Environment, report: &mut Report) -> Resolution {
    tracing::info!("Resolving project in {}", location.dir().display());

    let project = load_project(
        location.root.as_deref(),
        &location.project_file,
        &location.vars_file,
        env,
        report,
    );
    if !project.has_registry {
        report.push(ResolveError::MissingFile {
            path: location.vars_file.clone(),
        });
    }

    let source_dirs = project.config.source_dirs();
    let mut graph = DependencyGraph::discover(&source_dirs, report);

    let load_path = LoadPathExpander::new(&location.dir(), env, report).expand(&project);
    tracing::info!("Expanded load path has {} entries", load_path.len());

    graph.resolve(&load_path, report);

    Resolution {
        config: project.config,
        load_path,
        source_dirs,
        deps: graph.into_deps(),
    }
}
