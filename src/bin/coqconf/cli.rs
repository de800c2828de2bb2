//! CLI definitions using clap.

use std::path::PathBuf;
use std::sync::LazyLock;

use clap::Parser;
use regex::Regex;

static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)=(.*)$").expect("assignment pattern is valid"));

/// coqconf - generate a Makefile for a Coq project
#[derive(Parser)]
#[command(name = "coqconf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Variable values, as NAME=VALUE
    #[arg(value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub vars: Vec<(String, String)>,

    /// Prompt for the values of missing variables
    #[arg(short, long)]
    pub prompt: bool,

    /// Generate a Makefile even if dependency resolution failed
    #[arg(short, long)]
    pub keep_going: bool,

    /// Use -Q flags instead of -I ... -as ... (Coq 8.5 and later)
    #[arg(short = 'Q', long)]
    pub use_q: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory containing _CoqProject (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Where to write the Makefile
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the resolved load path and dependencies as JSON instead
    #[arg(long)]
    pub plan: bool,
}

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    let caps = ASSIGNMENT
        .captures(arg)
        .ok_or_else(|| format!("expected NAME=VALUE, got \"{}\"", arg))?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("LIBDIR=/ext/lib").unwrap(),
            ("LIBDIR".to_string(), "/ext/lib".to_string())
        );
        assert_eq!(
            parse_assignment("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
        assert_eq!(
            parse_assignment("A=b=c").unwrap(),
            ("A".to_string(), "b=c".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("BAD-NAME=x").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["coqconf", "-k", "-Q", "X=1", "--project-dir", "proj"]);
        assert!(cli.keep_going);
        assert!(cli.use_q);
        assert!(!cli.prompt);
        assert_eq!(cli.vars, vec![("X".to_string(), "1".to_string())]);
        assert_eq!(cli.project_dir, Some(PathBuf::from("proj")));
    }
}
