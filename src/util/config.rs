//! Configuration file support for coqconf.
//!
//! coqconf reads two optional configuration files:
//! - Global: `~/.coqconf/config.toml` - User-wide defaults
//! - Project: `.coqconf/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! arguments take precedence over both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default Coq compiler command.
pub const DEFAULT_COQC: &str = "coqc";

/// Default flags passed to the Coq compiler.
pub const DEFAULT_COQFLAGS: &str = "-noglob";

/// Default name of the generated Makefile.
pub const DEFAULT_MAKEFILE: &str = "Makefile";

/// coqconf configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Variable values, as if given as NAME=VALUE arguments
    pub variables: BTreeMap<String, String>,

    /// Build settings
    pub build: BuildConfig,
}

/// Makefile generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Generate a Makefile even if resolution failed
    pub keep_going: bool,

    /// Emit `-Q` load path flags instead of `-I ... -as ...`
    pub use_q: bool,

    /// Prompt for missing variables
    pub prompt: bool,

    /// Coq compiler command
    pub coqc: Option<String>,

    /// Flags for the Coq compiler
    pub coqflags: Option<String>,

    /// Path of the generated Makefile, relative to the project
    pub makefile: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        self.variables.extend(other.variables);

        if other.build.keep_going {
            self.build.keep_going = true;
        }
        if other.build.use_q {
            self.build.use_q = true;
        }
        if other.build.prompt {
            self.build.prompt = true;
        }
        if other.build.coqc.is_some() {
            self.build.coqc = other.build.coqc;
        }
        if other.build.coqflags.is_some() {
            self.build.coqflags = other.build.coqflags;
        }
        if other.build.makefile.is_some() {
            self.build.makefile = other.build.makefile;
        }
    }

    /// Coq compiler command, falling back to `coqc`.
    pub fn coqc(&self) -> &str {
        self.build.coqc.as_deref().unwrap_or(DEFAULT_COQC)
    }

    /// Coq compiler flags, falling back to `-noglob`.
    pub fn coqflags(&self) -> &str {
        self.build.coqflags.as_deref().unwrap_or(DEFAULT_COQFLAGS)
    }

    /// Makefile path, falling back to `Makefile`.
    pub fn makefile(&self) -> PathBuf {
        self.build
            .makefile
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MAKEFILE))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.coqconf/config.toml)
/// 2. Global config (~/.coqconf/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global coqconf config directory (~/.coqconf).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".coqconf"))
}

/// Get the global config path (~/.coqconf/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.coqconf/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".coqconf").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.variables.is_empty());
        assert!(!config.build.keep_going);
        assert_eq!(config.coqc(), "coqc");
        assert_eq!(config.coqflags(), "-noglob");
        assert_eq!(config.makefile(), PathBuf::from("Makefile"));
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[variables]
LIBDIR = "/ext/lib"

[build]
use_q = true
coqc = "/opt/coq/bin/coqc"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.variables.get("LIBDIR").map(String::as_str), Some("/ext/lib"));
        assert!(config.build.use_q);
        assert!(!config.build.keep_going);
        assert_eq!(config.coqc(), "/opt/coq/bin/coqc");
    }

    #[test]
    fn test_malformed_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[build\nuse_q = ").unwrap();

        let config = Config::load_or_default(&config_path);
        assert!(!config.build.use_q);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[variables]
LIBDIR = "/global/lib"
WORKSPACE = "/ws"

[build]
coqflags = "-noglob -w none"
keep_going = true
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[variables]
LIBDIR = "/project/lib"

[build]
coqflags = "-noglob"
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path);

        assert_eq!(config.variables["LIBDIR"], "/project/lib");
        assert_eq!(config.variables["WORKSPACE"], "/ws");
        assert_eq!(config.coqflags(), "-noglob");
        assert!(config.build.keep_going);
    }
}
