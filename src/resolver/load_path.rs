//! Load path expansion.
//!
//! Turns a project's directives into the ordered list of
//! `(namespace, directory)` pairs that Coq searches, walking directory trees
//! to give every valid subdirectory its own nested namespace.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::project::{Directive, PROJECT_FILE};
use crate::core::registry::VARS_FILE;
use crate::core::variables::Environment;
use crate::resolver::errors::{Report, ResolveError};
use crate::resolver::{load_project, LoadedProject};
use crate::util::fs::valid_dirs;
use crate::util::SlashPath;

/// Variable naming the parent directory of sibling projects.
pub const WORKSPACE_VAR: &str = "WORKSPACE";

/// One entry of the expanded load path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LoadPathEntry {
    /// Dotted namespace prefix, possibly empty
    pub namespace: String,
    /// Directory bound to the namespace
    pub directory: PathBuf,
}

impl LoadPathEntry {
    pub fn new(namespace: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        LoadPathEntry {
            namespace: namespace.into(),
            directory: directory.into(),
        }
    }
}

/// Combine a base namespace with a dotted suffix.
pub fn join_namespace(prefix: &str, suffix: &str) -> String {
    match (prefix.is_empty(), suffix.is_empty()) {
        (true, _) => suffix.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}.{}", prefix, suffix),
    }
}

/// Bind `directory` to `namespace`, and every valid subdirectory to the
/// corresponding nested namespace. Parents come before their children.
pub fn expand_tree(namespace: &str, directory: &Path, report: &mut Report) -> Vec<LoadPathEntry> {
    if !directory.is_dir() {
        report.push(ResolveError::MissingDirectory {
            directory: directory.to_path_buf(),
        });
        return Vec::new();
    }

    let base = SlashPath::from(directory);
    valid_dirs(directory)
        .map(|current| {
            let relative = SlashPath::from(&current).drop_first(base.len());
            let suffix = relative.segments().collect::<Vec<_>>().join(".");
            LoadPathEntry::new(join_namespace(namespace, &suffix), current)
        })
        .collect()
}

/// Remove repeated entries, keeping the first occurrence of each.
pub fn dedup_entries(entries: &[LoadPathEntry]) -> Vec<LoadPathEntry> {
    let mut seen: HashSet<&LoadPathEntry> = HashSet::with_capacity(entries.len());
    entries
        .iter()
        .filter(|entry| seen.insert(*entry))
        .cloned()
        .collect()
}

/// Expands directives into a load path, following project references.
pub struct LoadPathExpander<'a> {
    env: &'a mut Environment,
    report: &'a mut Report,
    /// Canonical roots of the projects currently being expanded
    stack: Vec<PathBuf>,
}

impl<'a> LoadPathExpander<'a> {
    /// Create an expander for the project rooted at `root`.
    pub fn new(root: &Path, env: &'a mut Environment, report: &'a mut Report) -> Self {
        LoadPathExpander {
            env,
            report,
            stack: vec![canonical(root)],
        }
    }

    /// Expand every directive of a loaded project, in order.
    pub fn expand(&mut self, project: &LoadedProject) -> Vec<LoadPathEntry> {
        let mut load_path = Vec::new();
        for directive in &project.config.directives {
            match directive {
                Directive::SourceLoadPath {
                    source_dir,
                    output_dir,
                } => {
                    let output_dir = output_dir
                        .as_ref()
                        .unwrap_or(&project.config.default_output);
                    load_path.extend(expand_tree("", source_dir, self.report));
                    load_path.extend(expand_tree("", output_dir, self.report));
                }
                Directive::DefaultOutput { dir } => {
                    load_path.extend(expand_tree("", dir, self.report));
                }
                Directive::ExternalLoadPath { dir, namespace } => {
                    let namespace = namespace.as_deref().unwrap_or("");
                    load_path.extend(expand_tree(namespace, dir, self.report));
                }
                Directive::AbstractLoadPath { id } => {
                    let Some(directories) = project.libraries.get(id) else {
                        tracing::debug!("no registry entries for abstract load path {}", id);
                        continue;
                    };
                    for resolved in directories {
                        let directory = PathBuf::from(&resolved.directory);
                        if !directory.is_dir() {
                            self.report
                                .push(ResolveError::MissingDirectory { directory });
                        } else if resolved.recursive {
                            load_path.extend(expand_tree(
                                &resolved.namespace,
                                &directory,
                                self.report,
                            ));
                        } else {
                            load_path.push(LoadPathEntry::new(&resolved.namespace, directory));
                        }
                    }
                }
                Directive::ProjectLoadPath { project } => {
                    load_path.extend(self.expand_project(project));
                }
            }
        }
        load_path
    }

    /// Locate a referenced project and splice in its whole load path.
    fn expand_project(&mut self, name: &str) -> Vec<LoadPathEntry> {
        let project_var = format!("{}_PROJECT_PATH", name.to_uppercase());
        let root = match (self.env.get(&project_var), self.env.get(WORKSPACE_VAR)) {
            (Some(path), _) => Some(SlashPath::parse(path)),
            (None, Some(workspace)) => Some(SlashPath::parse(workspace).append(name)),
            (None, None) => None,
        };

        let root = match root {
            Some(root) if root.is_dir() => root.to_path_buf(),
            other => {
                self.report.push(ResolveError::UnresolvedSubProject {
                    project: name.to_string(),
                    project_var,
                    hint: other.is_none(),
                });
                return Vec::new();
            }
        };

        let key = canonical(&root);
        if self.stack.contains(&key) {
            let mut chain: Vec<String> = self
                .stack
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            chain.push(key.display().to_string());
            self.report.push(ResolveError::CyclicProject {
                project: name.to_string(),
                chain,
            });
            return Vec::new();
        }

        tracing::info!("Expanding project `{}` at {}", name, root.display());
        let project = load_project(
            Some(&root),
            &root.join(PROJECT_FILE),
            &root.join(VARS_FILE),
            self.env,
            self.report,
        );

        self.stack.push(key);
        let load_path = self.expand(&project);
        self.stack.pop();
        load_path
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn names(entries: &[LoadPathEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.namespace.as_str()).collect()
    }

    fn write_project(dir: &Path, project_file: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(PROJECT_FILE), project_file).unwrap();
    }

    fn expand_root(root: &Path, values: &[(&str, String)]) -> (Vec<LoadPathEntry>, Report) {
        let mut env = Environment::new(
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        );
        let mut report = Report::new();
        let project = load_project(
            Some(root),
            &root.join(PROJECT_FILE),
            &root.join(VARS_FILE),
            &mut env,
            &mut report,
        );
        let load_path = LoadPathExpander::new(root, &mut env, &mut report).expand(&project);
        (load_path, report)
    }

    #[test]
    fn test_join_namespace() {
        assert_eq!(join_namespace("", "a.b.c"), "a.b.c");
        assert_eq!(join_namespace("P", ""), "P");
        assert_eq!(join_namespace("P", "a.b.c"), "P.a.b.c");
        assert_eq!(join_namespace("", ""), "");
    }

    #[test]
    fn test_expand_tree_namespaces() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
        let mut report = Report::new();

        let prefixed = expand_tree("P", tmp.path(), &mut report);
        assert_eq!(names(&prefixed), vec!["P", "P.a", "P.a.b", "P.a.b.c"]);
        assert_eq!(prefixed[3].directory, tmp.path().join("a/b/c"));

        let bare = expand_tree("", tmp.path(), &mut report);
        assert_eq!(names(&bare), vec!["", "a", "a.b", "a.b.c"]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_expand_tree_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("x/y")).unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::create_dir_all(tmp.path().join("a")).unwrap();
        let mut report = Report::new();

        let first = expand_tree("Lib", tmp.path(), &mut report);
        let second = expand_tree("Lib", tmp.path(), &mut report);
        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["Lib", "Lib.a", "Lib.b", "Lib.x", "Lib.x.y"]);
    }

    #[test]
    fn test_expand_tree_prunes_invalid_names() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("good/inner")).unwrap();
        fs::create_dir_all(tmp.path().join("has space/inner")).unwrap();
        fs::create_dir_all(tmp.path().join("has.dot/inner")).unwrap();
        let mut report = Report::new();

        let entries = expand_tree("", tmp.path(), &mut report);
        assert_eq!(names(&entries), vec!["", "good", "good.inner"]);
    }

    #[test]
    fn test_missing_directory_is_dropped_with_warning() {
        let tmp = TempDir::new().unwrap();
        let mut report = Report::new();

        let entries = expand_tree("X", &tmp.path().join("nope"), &mut report);
        assert!(entries.is_empty());
        assert!(matches!(
            report.issues()[0],
            ResolveError::MissingDirectory { .. }
        ));
        assert!(!report.failed());
    }

    #[test]
    fn test_dedup_entries_keeps_first() {
        let entries = vec![
            LoadPathEntry::new("A", "/a"),
            LoadPathEntry::new("B", "/b"),
            LoadPathEntry::new("A", "/a"),
            LoadPathEntry::new("A", "/other"),
        ];
        assert_eq!(
            dedup_entries(&entries),
            vec![
                LoadPathEntry::new("A", "/a"),
                LoadPathEntry::new("B", "/b"),
                LoadPathEntry::new("A", "/other"),
            ]
        );
    }

    #[test]
    fn test_directive_order() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let ext = tmp.path().join("ext");
        let flat = tmp.path().join("flat");
        fs::create_dir_all(root.join("src/Sub")).unwrap();
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(ext.join("Deep")).unwrap();
        fs::create_dir_all(flat.join("Ignored")).unwrap();

        write_project(
            &root,
            &format!(
                "KOPITIAM_0 lp \"SourceLoadPath src\"\n\
                 KOPITIAM_1 lp \"ExternalLoadPath '{}' Ext\"\n\
                 KOPITIAM_2 lp \"AbstractLoadPath flat\"\n",
                ext.display()
            ),
        );
        fs::write(
            root.join(VARS_FILE),
            "var FLAT \"flat dir\"\nalp flat include \"$(FLAT)\" \"Flat\"\nalp flat include \"/missing/dir\" \"Gone\"\n",
        )
        .unwrap();

        let (load_path, report) = expand_root(&root, &[("FLAT", flat.display().to_string())]);

        assert_eq!(
            names(&load_path),
            vec!["", "Sub", "", "Ext", "Ext.Deep", "Flat"]
        );
        assert_eq!(load_path[2].directory, root.join("bin"));
        assert_eq!(load_path[5].directory, flat);
        // The missing library directory is only a warning.
        assert_eq!(report.issues().len(), 1);
        assert!(!report.failed());
    }

    #[test]
    fn test_sub_project_is_spliced_in_place() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main");
        let core = tmp.path().join("core");
        fs::create_dir_all(main.join("src")).unwrap();
        fs::create_dir_all(main.join("bin")).unwrap();
        fs::create_dir_all(core.join("theories/Util")).unwrap();
        fs::create_dir_all(core.join("out")).unwrap();

        write_project(
            &main,
            "KOPITIAM_0 lp \"ProjectLoadPath core\"\nKOPITIAM_1 lp \"SourceLoadPath src\"\n",
        );
        write_project(
            &core,
            "KOPITIAM_0 lp \"DefaultOutput out\"\nKOPITIAM_1 lp \"SourceLoadPath theories\"\n",
        );

        let (load_path, report) =
            expand_root(&main, &[(WORKSPACE_VAR, tmp.path().display().to_string())]);

        assert!(report.is_empty(), "{:?}", report);
        let dirs: Vec<_> = load_path.iter().map(|e| e.directory.clone()).collect();
        assert_eq!(
            dirs,
            vec![
                core.join("out"),
                core.join("theories"),
                core.join("theories/Util"),
                core.join("out"),
                main.join("src"),
                main.join("bin"),
            ]
        );
    }

    #[test]
    fn test_project_variable_takes_precedence() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main");
        let elsewhere = tmp.path().join("elsewhere");
        fs::create_dir_all(elsewhere.join("src")).unwrap();
        write_project(&main, "KOPITIAM_0 lp \"ProjectLoadPath my-lib\"\n");
        write_project(&elsewhere, "KOPITIAM_0 lp \"DefaultOutput src\"\n");

        let (load_path, report) = expand_root(
            &main,
            &[
                ("MY-LIB_PROJECT_PATH", elsewhere.display().to_string()),
                (WORKSPACE_VAR, "/nonexistent".to_string()),
            ],
        );

        assert!(report.is_empty(), "{:?}", report);
        assert_eq!(load_path, vec![LoadPathEntry::new("", elsewhere.join("src"))]);
    }

    #[test]
    fn test_unresolved_sub_project() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "KOPITIAM_0 lp \"ProjectLoadPath core\"\n");

        let (load_path, report) = expand_root(tmp.path(), &[]);

        assert!(load_path.is_empty());
        assert!(report.failed());
        let message = report.issues()[0].to_string();
        assert!(message.contains("CORE_PROJECT_PATH"), "{}", message);
        assert!(message.contains("WORKSPACE"), "{}", message);
    }

    #[test]
    fn test_cyclic_projects_terminate() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        write_project(&a, "KOPITIAM_0 lp \"ProjectLoadPath b\"\n");
        write_project(&b, "KOPITIAM_0 lp \"ProjectLoadPath a\"\n");

        let (load_path, report) =
            expand_root(&a, &[(WORKSPACE_VAR, tmp.path().display().to_string())]);

        assert!(load_path.is_empty());
        assert!(report.failed());
        assert!(report
            .issues()
            .iter()
            .any(|i| matches!(i, ResolveError::CyclicProject { project, .. } if project == "a")));
    }
}
