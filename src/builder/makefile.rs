//! Makefile generation.
//!
//! The generated Makefile carries the whole resolved load path as `COQFLAGS`,
//! one pattern rule per source directory, and an explicit prerequisite line
//! for every object so that make orders the compilation.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::resolver::Resolution;
use crate::util::config::{DEFAULT_COQC, DEFAULT_COQFLAGS};

/// Version of the generated Makefile's layout.
pub const FORMAT_VERSION: u32 = 7;

/// How the load path is passed to coqc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPathFlags {
    /// `-I "dir" -as "namespace"`
    #[default]
    IncludeAs,
    /// `-Q "dir" "namespace"` (Coq 8.5 and later)
    Qualified,
}

/// Settings for the generated Makefile.
#[derive(Debug, Clone)]
pub struct MakefileOptions {
    pub flags: LoadPathFlags,
    pub coqc: String,
    pub coqflags: String,
    /// Shown in the header comment
    pub project: String,
    /// Shown in the header comment
    pub generated_at: String,
}

impl Default for MakefileOptions {
    fn default() -> Self {
        MakefileOptions {
            flags: LoadPathFlags::default(),
            coqc: DEFAULT_COQC.to_string(),
            coqflags: DEFAULT_COQFLAGS.to_string(),
            project: ".".to_string(),
            generated_at: chrono::Local::now().to_rfc2822(),
        }
    }
}

/// Render the Makefile for a resolution.
pub fn render(resolution: &Resolution, opts: &MakefileOptions) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        "# Generated by coqconf v{} on \"{}\"\n\
         # at {}.\n\
         #\n\
         # This Makefile was automatically generated; any local changes you may make\n\
         # will not be preserved when it is next regenerated.\n\
         \n\
         COQC = {}\n\
         COQFLAGS = {}\n\
         override _COQCMD = \\\n\
         \tmkdir -p \"`dirname \"$@\"`\" && $(COQC) $(COQFLAGS) \"$<\" && mv \"$<o\" \"$@\"\n\
         \n",
        FORMAT_VERSION, opts.project, opts.generated_at, opts.coqc, opts.coqflags
    );

    for entry in resolution.unique_load_path() {
        let dir = entry.directory.display();
        let _ = match opts.flags {
            LoadPathFlags::IncludeAs => writeln!(
                out,
                "override COQFLAGS += -I \"{}\" -as \"{}\"",
                dir, entry.namespace
            ),
            LoadPathFlags::Qualified => writeln!(
                out,
                "override COQFLAGS += -Q \"{}\" \"{}\"",
                dir, entry.namespace
            ),
        };
    }

    let mut rules: Vec<(&Path, &Path)> = Vec::new();
    for (src, bin) in &resolution.source_dirs {
        let pair = (bin.as_path(), src.as_path());
        if !rules.contains(&pair) {
            rules.push(pair);
        }
    }
    for (bin, src) in rules {
        let _ = write!(
            out,
            "\n{}/%.vo: {}/%.v\n\t$(_COQCMD)\n",
            bin.display(),
            src.display()
        );
    }

    let objects: Vec<String> = resolution
        .deps
        .keys()
        .map(|artifact| artifact.display().to_string())
        .collect();
    let _ = write!(
        out,
        "\nOBJECTS = \\\n\t{}\n\nall: $(OBJECTS)\nclean:\n\trm -f $(OBJECTS)\n\n",
        objects.join(" \\\n\t")
    );

    for (artifact, prereqs) in &resolution.deps {
        let prereqs: Vec<String> = prereqs.iter().map(|p| p.display().to_string()).collect();
        let _ = writeln!(out, "{}: {}", artifact.display(), prereqs.join(" "));
    }

    out
}

/// Write the Makefile to `path`.
pub fn write_makefile(path: &Path, resolution: &Resolution, opts: &MakefileOptions) -> Result<()> {
    let contents = render(resolution, opts);
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}
