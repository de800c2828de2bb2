//! Variables and their substitution into abstract library directories.
//!
//! A registry declares the variables it expects and the directory templates
//! that use them. Values come from the command line or configuration, and
//! missing ones can be asked for interactively through a [`Prompter`].

use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};

use serde::Serialize;

use crate::core::registry::{DirectoryTemplate, RegistryLayout};
use crate::resolver::errors::{Report, ResolveError};

/// Something that can be asked for a variable's value.
pub trait Prompter {
    /// Ask for `name`. `message` explains what is wanted; `default` is shown
    /// and returned when the answer is empty.
    fn prompt(&mut self, name: &str, message: &str, default: Option<&str>) -> Option<String>;
}

/// Never asks; always returns the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn prompt(&mut self, _name: &str, _message: &str, default: Option<&str>) -> Option<String> {
        default.map(str::to_string)
    }
}

/// Asks on the terminal, reading answers from a line-oriented input.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LinePrompter { input, output }
    }
}

/// A prompter reading from stdin and writing questions to stderr.
pub fn stdin_prompter() -> LinePrompter<io::StdinLock<'static>, io::Stderr> {
    LinePrompter::new(io::stdin().lock(), io::stderr())
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn prompt(&mut self, name: &str, message: &str, default: Option<&str>) -> Option<String> {
        let question = match default {
            Some(default) => format!("{}\n{} [{}]: ", message, name, default),
            None => format!("{}\n{}: ", message, name),
        };
        if self
            .output
            .write_all(question.as_bytes())
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return default.map(str::to_string);
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => default.map(str::to_string),
            Ok(_) => {
                let answer = answer.trim_end_matches(['\r', '\n']);
                if answer.is_empty() {
                    default.map(str::to_string)
                } else {
                    Some(answer.to_string())
                }
            }
        }
    }
}

/// Variable values known to this run, plus the means to ask for more.
pub struct Environment {
    values: BTreeMap<String, String>,
    prompter: Box<dyn Prompter>,
}

impl Environment {
    /// An environment that never prompts.
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Environment::with_prompter(values, Box::new(NoPrompt))
    }

    pub fn with_prompter(values: BTreeMap<String, String>, prompter: Box<dyn Prompter>) -> Self {
        Environment { values, prompter }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Look up a variable, asking the prompter if it has no value.
    ///
    /// Prompted answers are returned but not stored.
    pub fn lookup_or_prompt(
        &mut self,
        name: &str,
        message: &str,
        default: Option<&str>,
    ) -> Option<String> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.prompter.prompt(name, message, default)
    }
}

/// One directory of an abstract library after substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDirectory {
    /// Directory, with unknown `$(VAR)` markers left in place
    pub directory: String,
    /// Namespace the directory is bound to
    pub namespace: String,
    /// Whether subdirectories are added as nested namespaces
    pub recursive: bool,
}

/// Abstract library id to its directories, in registry order.
pub type ResolvedLibraries = HashMap<String, Vec<ResolvedDirectory>>;

/// The marker for a variable inside a directory template.
pub fn marker(name: &str) -> String {
    format!("$({})", name)
}

/// Join quoted names as "A", "A and B", or "A, B and C".
pub fn natural_list(items: &[String]) -> Option<String> {
    match items {
        [] => None,
        [only] => Some(only.clone()),
        [init @ .., last] => Some(format!("{} and {}", init.join(", "), last)),
    }
}

/// Make sure every expected variable has a value, then substitute all known
/// values into the layout's directory templates.
pub fn substitute_variables(
    layout: &RegistryLayout,
    env: &mut Environment,
    report: &mut Report,
) -> ResolvedLibraries {
    for (name, description) in &layout.expected_vars {
        let message = format!("Specify a value for \"{}\".", description);
        if let Some(value) = env.lookup_or_prompt(name, &message, None) {
            env.set(name.clone(), value);
            continue;
        }

        let var_marker = marker(name);
        let mut affected: Vec<String> = Vec::new();
        for (id, template) in &layout.templates {
            let display = format!("\"{}\"", layout.display_name(id));
            if template.directory.contains(&var_marker) && !affected.contains(&display) {
                affected.push(display);
            }
        }
        report.push(ResolveError::UnresolvedVariable {
            variable: name.clone(),
            libraries: natural_list(&affected),
        });
    }

    let mut resolved = ResolvedLibraries::new();
    for (id, template) in &layout.templates {
        resolved
            .entry(id.clone())
            .or_default()
            .push(substitute(template, env.values()));
    }
    resolved
}

fn substitute(template: &DirectoryTemplate, values: &BTreeMap<String, String>) -> ResolvedDirectory {
    let mut directory = template.directory.clone();
    for (name, value) in values {
        directory = directory.replace(&marker(name), value);
    }
    ResolvedDirectory {
        directory,
        namespace: template.namespace.clone(),
        recursive: template.recursive,
    }
}
