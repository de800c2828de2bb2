//! The variable and abstract library registry (`configure.coqoon.vars`).
//!
//! The registry is written by the IDE and lists, for every abstract load
//! path the project uses, the directories it stands for. Those directories
//! may contain `$(VAR)` markers for site-specific locations.
//!
//! ```text
//! var COQLIB "the Coq library directory"
//! alp coq name "Coq 8.4 standard library"
//! alp coq include-recursive "$(COQLIB)/theories" "Coq"
//! alp coq include "$(COQLIB)/user-contrib" ""
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::resolver::errors::{Report, ResolveError};
use crate::util::fs::read_optional;
use crate::util::shlex;

/// Default registry file name inside a project.
pub const VARS_FILE: &str = "configure.coqoon.vars";

/// One record of the registry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEntry {
    /// `var NAME "description"`
    Var { name: String, description: String },
    /// `alp ID name "Display Name"`
    LibraryName { id: String, name: String },
    /// `alp ID include[-recursive] "dir-template" "namespace"`
    LibraryInclude {
        id: String,
        directory: String,
        namespace: String,
        recursive: bool,
    },
}

/// The records of a registry file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    pub entries: Vec<RegistryEntry>,
}

/// A directory of an abstract library before variable substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTemplate {
    pub directory: String,
    pub namespace: String,
    pub recursive: bool,
}

/// The registry restructured for substitution.
#[derive(Debug, Clone, Default)]
pub struct RegistryLayout {
    /// Variable name to description
    pub expected_vars: BTreeMap<String, String>,
    /// Abstract library id to display name
    pub names: HashMap<String, String>,
    /// Directory templates in registry order
    pub templates: Vec<(String, DirectoryTemplate)>,
}

impl RegistryLayout {
    /// Display name of a library, falling back to its id.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }
}

impl Registry {
    /// Load a registry file.
    ///
    /// A missing file yields an empty registry; any other read failure is
    /// recorded in `report` and also yields an empty registry.
    pub fn load(path: &Path, report: &mut Report) -> Registry {
        match read_optional(path) {
            Ok(Some(contents)) => Registry::parse(&contents, path, report),
            Ok(None) => {
                tracing::debug!("no registry at {}", path.display());
                Registry::default()
            }
            Err(source) => {
                report.push(ResolveError::Io {
                    path: path.to_path_buf(),
                    source,
                });
                Registry::default()
            }
        }
    }

    /// Parse registry text.
    ///
    /// Unrecognised tokens are skipped one at a time until a record start is
    /// found again.
    pub fn parse(contents: &str, path: &Path, report: &mut Report) -> Registry {
        let tokens = match shlex::split_with_comments(contents) {
            Ok(tokens) => tokens,
            Err(e) => {
                report.push(ResolveError::MalformedLine {
                    path: path.to_path_buf(),
                    line: None,
                    reason: e.to_string(),
                });
                return Registry::default();
            }
        };

        let mut entries = Vec::new();
        let mut rest = tokens.as_slice();
        while !rest.is_empty() {
            match parse_entry(rest) {
                Some((entry, consumed)) => {
                    entries.push(entry);
                    rest = &rest[consumed..];
                }
                None => {
                    tracing::debug!("skipping registry token {:?}", rest[0]);
                    rest = &rest[1..];
                }
            }
        }

        Registry { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restructure the records into variables, names, and templates.
    pub fn structure(&self) -> RegistryLayout {
        let mut layout = RegistryLayout::default();
        for entry in &self.entries {
            match entry {
                RegistryEntry::Var { name, description } => {
                    layout
                        .expected_vars
                        .insert(name.clone(), description.clone());
                }
                RegistryEntry::LibraryName { id, name } => {
                    layout.names.insert(id.clone(), name.clone());
                }
                RegistryEntry::LibraryInclude {
                    id,
                    directory,
                    namespace,
                    recursive,
                } => layout.templates.push((
                    id.clone(),
                    DirectoryTemplate {
                        directory: directory.clone(),
                        namespace: namespace.clone(),
                        recursive: *recursive,
                    },
                )),
            }
        }
        layout
    }
}

fn parse_entry(tokens: &[String]) -> Option<(RegistryEntry, usize)> {
    match tokens {
        [kw, name, description, ..] if kw == "var" => Some((
            RegistryEntry::Var {
                name: name.clone(),
                description: description.clone(),
            },
            3,
        )),
        [kw, id, kind, name, ..] if kw == "alp" && kind == "name" => Some((
            RegistryEntry::LibraryName {
                id: id.clone(),
                name: name.clone(),
            },
            4,
        )),
        [kw, id, kind, directory, namespace, ..]
            if kw == "alp" && (kind == "include" || kind == "include-recursive") =>
        {
            Some((
                RegistryEntry::LibraryInclude {
                    id: id.clone(),
                    directory: directory.clone(),
                    namespace: namespace.clone(),
                    recursive: kind == "include-recursive",
                },
                5,
            ))
        }
        _ => None,
    }
}
