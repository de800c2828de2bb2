//! `_CoqProject` parsing.
//!
//! Only lines tagged `KOPITIAM_<n>` are read. Each carries one quoted load
//! path directive:
//!
//! ```text
//! KOPITIAM_0 lp "SourceLoadPath src bin"
//! KOPITIAM_1 lp "AbstractLoadPath dk.itu.sdg.kopitiam/lp/coq/8.4"
//! KOPITIAM_2 lp "ExternalLoadPath /opt/ssreflect Ssreflect"
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::variables::Environment;
use crate::resolver::errors::{Report, ResolveError};
use crate::util::fs::read_optional;
use crate::util::{shlex, SlashPath};

/// Default project file name.
pub const PROJECT_FILE: &str = "_CoqProject";

/// Prefix of directive lines.
pub const LINE_TAG: &str = "KOPITIAM_";

/// Abstract load path used when a project has no `_CoqProject`.
pub const FALLBACK_LIBRARY: &str = "dk.itu.sdg.kopitiam/lp/coq/8.4";

/// A load path directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Directive {
    /// A source directory and, optionally, where its objects go
    SourceLoadPath {
        source_dir: PathBuf,
        output_dir: Option<PathBuf>,
    },
    /// The output directory for source directories without one
    DefaultOutput { dir: PathBuf },
    /// A directory outside the project, optionally bound to a namespace
    ExternalLoadPath {
        dir: PathBuf,
        namespace: Option<String>,
    },
    /// A library described by the registry
    AbstractLoadPath { id: String },
    /// Another project
    ProjectLoadPath { project: String },
}

/// A loaded project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectConfig {
    /// Output directory for source directories without their own
    pub default_output: PathBuf,
    /// Directives in search order
    pub directives: Vec<Directive>,
}

impl ProjectConfig {
    /// The configuration used when a project has no `_CoqProject`.
    pub fn fallback(root: Option<&Path>) -> Self {
        let root = root_path(root);
        ProjectConfig {
            default_output: root.append("bin").to_path_buf(),
            directives: vec![
                Directive::SourceLoadPath {
                    source_dir: root.append("src").to_path_buf(),
                    output_dir: Some(root.append("bin").to_path_buf()),
                },
                Directive::AbstractLoadPath {
                    id: FALLBACK_LIBRARY.to_string(),
                },
            ],
        }
    }

    /// Load a project file.
    ///
    /// With no `root`, paths read from the file stay relative. A missing file
    /// yields [`ProjectConfig::fallback`].
    pub fn load(
        root: Option<&Path>,
        path: &Path,
        env: &mut Environment,
        report: &mut Report,
    ) -> ProjectConfig {
        match read_optional(path) {
            Ok(Some(contents)) => ProjectConfig::parse(root, &contents, path, env, report),
            Ok(None) => {
                tracing::debug!("{} not found, using defaults", path.display());
                ProjectConfig::fallback(root)
            }
            Err(source) => {
                report.push(ResolveError::Io {
                    path: path.to_path_buf(),
                    source,
                });
                ProjectConfig::fallback(root)
            }
        }
    }

    /// Parse project file text.
    pub fn parse(
        root: Option<&Path>,
        contents: &str,
        path: &Path,
        env: &mut Environment,
        report: &mut Report,
    ) -> ProjectConfig {
        let root = root_path(root);
        let mut config = ProjectConfig {
            default_output: root.append("bin").to_path_buf(),
            directives: Vec::new(),
        };

        for (number, line) in contents.lines().enumerate() {
            if !line.starts_with(LINE_TAG) {
                continue;
            }
            let malformed = |reason: String| ResolveError::MalformedLine {
                path: path.to_path_buf(),
                line: Some(number + 1),
                reason,
            };

            let (index, payload) = match split_line(line) {
                Ok(parts) => parts,
                Err(reason) => {
                    report.push(malformed(reason));
                    continue;
                }
            };
            let directive = match decode_directive(&payload) {
                Ok(directive) => directive,
                Err(reason) => {
                    report.push(malformed(reason));
                    continue;
                }
            };

            let directive = match directive {
                Directive::SourceLoadPath {
                    source_dir,
                    output_dir,
                } => Directive::SourceLoadPath {
                    source_dir: rooted(&root, &source_dir),
                    output_dir: output_dir.map(|dir| rooted(&root, &dir)),
                },
                Directive::DefaultOutput { dir } => {
                    let dir = rooted(&root, &dir);
                    config.default_output = dir.clone();
                    Directive::DefaultOutput { dir }
                }
                Directive::ExternalLoadPath { dir, namespace } => {
                    let dir = locate_external(&index, dir, namespace.as_deref(), env, report);
                    Directive::ExternalLoadPath { dir, namespace }
                }
                other => other,
            };
            tracing::debug!("directive {}: {:?}", index, directive);
            config.directives.push(directive);
        }

        config
    }

    /// `(source, output)` pairs for every source load path.
    pub fn source_dirs(&self) -> Vec<(PathBuf, PathBuf)> {
        self.directives
            .iter()
            .filter_map(|directive| match directive {
                Directive::SourceLoadPath {
                    source_dir,
                    output_dir,
                } => Some((
                    source_dir.clone(),
                    output_dir
                        .clone()
                        .unwrap_or_else(|| self.default_output.clone()),
                )),
                _ => None,
            })
            .collect()
    }
}

fn root_path(root: Option<&Path>) -> SlashPath {
    root.map(SlashPath::from).unwrap_or_default()
}

fn rooted(root: &SlashPath, relative: &Path) -> PathBuf {
    root.append_path(&SlashPath::from(relative)).to_path_buf()
}

/// Split a directive line into its index and payload words.
fn split_line(line: &str) -> Result<(String, Vec<String>), String> {
    let fields = shlex::split(line).map_err(|e| e.to_string())?;
    let [tag, _marker, payload] = fields.as_slice() else {
        return Err(format!("expected 3 fields, found {}", fields.len()));
    };
    let index = tag.strip_prefix(LINE_TAG).unwrap_or(tag).to_string();
    let payload = shlex::split(payload).map_err(|e| e.to_string())?;
    Ok((index, payload))
}

fn decode_directive(payload: &[String]) -> Result<Directive, String> {
    let field = |i: usize| payload.get(i).cloned();
    let kind = payload.first().map(String::as_str).unwrap_or("");
    let required = |i: usize| field(i).ok_or_else(|| format!("{} needs an argument", kind));

    match kind {
        "SourceLoadPath" => Ok(Directive::SourceLoadPath {
            source_dir: PathBuf::from(required(1)?),
            output_dir: field(2).map(PathBuf::from),
        }),
        "DefaultOutput" => Ok(Directive::DefaultOutput {
            dir: PathBuf::from(required(1)?),
        }),
        "ExternalLoadPath" => Ok(Directive::ExternalLoadPath {
            dir: PathBuf::from(required(1)?),
            namespace: field(2),
        }),
        "AbstractLoadPath" => Ok(Directive::AbstractLoadPath { id: required(1)? }),
        "ProjectLoadPath" => Ok(Directive::ProjectLoadPath {
            project: required(1)?,
        }),
        "" => Err("empty directive".to_string()),
        other => Err(format!("unknown directive `{}`", other)),
    }
}

/// Find the directory of an external load path, asking for `EXT_<index>` if
/// the declared one does not exist.
fn locate_external(
    index: &str,
    dir: PathBuf,
    namespace: Option<&str>,
    env: &mut Environment,
    report: &mut Report,
) -> PathBuf {
    if dir.is_dir() {
        return dir;
    }

    let library = namespace.unwrap_or("(unknown)");
    let variable = format!("EXT_{}", index);
    let message = format!("Specify the path to the \"{}\" library.", library);
    let declared = dir.to_string_lossy().into_owned();
    let dir = env
        .lookup_or_prompt(&variable, &message, Some(&declared))
        .map(PathBuf::from)
        .unwrap_or(dir);

    if !dir.is_dir() {
        report.push(ResolveError::UnresolvedExternalPath {
            library: library.to_string(),
            variable,
        });
    }
    dir
}
