//! Source discovery and import resolution.
//!
//! Every `.v` file under a source root becomes a `.vo` target in the mirrored
//! output root. The `Require` statements of each file are then matched
//! against the expanded load path to find the objects it depends on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::resolver::errors::{Report, ResolveError};
use crate::resolver::load_path::LoadPathEntry;
use crate::util::fs::{ensure_dir, files_in, valid_dirs};
use crate::util::{shlex, SlashPath};

/// Extension of Coq source files.
pub const SOURCE_EXTENSION: &str = "v";

/// Suffix appended to a source file name to name its compiled object.
pub const OBJECT_SUFFIX: &str = "o";

static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Require\s+(?:Import\s+|Export\s+)?(.*?)\s*\.(?:\s|$)")
        .expect("Require pattern is valid")
});

/// Extract the library identifiers named by `Require` statements, in order.
///
/// Statements are matched one line at a time; a `Require` split across lines
/// is not recognised.
pub fn extract_identifiers(text: &str) -> Vec<String> {
    let mut identifiers = Vec::new();
    for captures in text.lines().flat_map(|line| REQUIRE.captures_iter(line)) {
        let list = &captures[1];
        match shlex::split(list) {
            Ok(words) => identifiers.extend(words),
            Err(e) => tracing::debug!("ignoring unparseable Require list {:?}: {}", list, e),
        }
    }
    identifiers
}

/// A compiled object and the source it is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
    pub artifact: PathBuf,
    pub source: PathBuf,
}

/// A target whose imports have not been resolved yet.
#[derive(Debug, Clone)]
struct PendingImports {
    target: BuildTarget,
    identifiers: Vec<String>,
}

/// Targets and their prerequisites.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Artifact to prerequisites; the first is always the artifact's source
    deps: BTreeMap<PathBuf, Vec<PathBuf>>,
    pending: Vec<PendingImports>,
}

impl DependencyGraph {
    /// Find every source file under the given `(source, output)` roots.
    ///
    /// Output directories are created as they are found, so the load path
    /// expansion that follows can rely on them.
    pub fn discover(source_dirs: &[(PathBuf, PathBuf)], report: &mut Report) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        for (source_root, output_root) in source_dirs {
            graph.discover_root(source_root, output_root, report);
        }
        tracing::info!("Discovered {} source files", graph.deps.len());
        graph
    }

    fn discover_root(&mut self, source_root: &Path, output_root: &Path, report: &mut Report) {
        // Reported as missing by the load path expansion.
        if !source_root.is_dir() {
            tracing::debug!("no source directory {}", source_root.display());
            return;
        }

        let src_base = SlashPath::from(source_root);
        let bin_base = SlashPath::from(output_root);
        for current in valid_dirs(source_root) {
            let src_dir = SlashPath::from(&current);
            let bin_dir = bin_base.append_path(&src_dir.drop_first(src_base.len()));

            let bin_path = bin_dir.to_path_buf();
            if let Err(source) = ensure_dir(&bin_path) {
                report.push(ResolveError::Io {
                    path: bin_path,
                    source,
                });
                continue;
            }

            let files = match files_in(&current) {
                Ok(files) => files,
                Err(source) => {
                    report.push(ResolveError::Io {
                        path: current.clone(),
                        source,
                    });
                    continue;
                }
            };

            for file in files {
                if file.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
                    continue;
                }
                let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned())
                else {
                    continue;
                };
                let source = src_dir.append(&name).to_path_buf();
                let artifact = bin_dir
                    .append(&format!("{}{}", name, OBJECT_SUFFIX))
                    .to_path_buf();
                self.add_target(source, artifact, report);
            }
        }
    }

    fn add_target(&mut self, source: PathBuf, artifact: PathBuf, report: &mut Report) {
        let identifiers = match std::fs::read_to_string(&source) {
            Ok(text) => extract_identifiers(&text),
            Err(e) => {
                report.push(ResolveError::Io {
                    path: source.clone(),
                    source: e,
                });
                Vec::new()
            }
        };
        tracing::debug!(
            "{} requires {:?}",
            source.display(),
            identifiers
        );

        self.deps.insert(artifact.clone(), vec![source.clone()]);
        self.pending.push(PendingImports {
            target: BuildTarget { artifact, source },
            identifiers,
        });
    }

    /// Resolve every discovered import against `load_path`.
    ///
    /// An identifier resolves to the first load path entry under which its
    /// object either exists or will be built by this graph.
    pub fn resolve(&mut self, load_path: &[LoadPathEntry], report: &mut Report) {
        let pending = std::mem::take(&mut self.pending);
        for PendingImports {
            target,
            identifiers,
        } in pending
        {
            for identifier in identifiers {
                match self.locate(&identifier, load_path) {
                    Some(found) => {
                        tracing::debug!("{} -> {}", identifier, found.display());
                        if let Some(prereqs) = self.deps.get_mut(&target.artifact) {
                            prereqs.push(found);
                        }
                    }
                    None => report.push(ResolveError::UnresolvedImport {
                        source_file: target.source.clone(),
                        identifier,
                    }),
                }
            }
        }
    }

    fn locate(&self, identifier: &str, load_path: &[LoadPathEntry]) -> Option<PathBuf> {
        let (namespace, leaf) = identifier.rsplit_once('.').unwrap_or(("", identifier));
        let namespace: Vec<&str> = dotted(namespace).collect();
        let object = format!("{}.{}{}", leaf, SOURCE_EXTENSION, OBJECT_SUFFIX);

        load_path.iter().find_map(|entry| {
            let prefix: Vec<&str> = dotted(&entry.namespace).collect();
            let remainder = if namespace.starts_with(&prefix) {
                &namespace[prefix.len()..]
            } else {
                &namespace[..]
            };

            let candidate = remainder
                .iter()
                .fold(SlashPath::from(&entry.directory), |path, segment| {
                    path.append(segment)
                })
                .append(&object)
                .to_path_buf();

            (candidate.exists() || self.deps.contains_key(&candidate)).then_some(candidate)
        })
    }

    /// Artifacts and their prerequisites, sorted by artifact.
    pub fn into_deps(self) -> BTreeMap<PathBuf, Vec<PathBuf>> {
        self.deps
    }
}

fn dotted(namespace: &str) -> impl Iterator<Item = &str> {
    namespace.split('.').filter(|s| !s.is_empty())
}
