//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Whether a directory name can be part of a logical namespace.
///
/// Names containing whitespace or a literal `.` cannot be mapped to a dotted
/// namespace component.
pub fn is_name_valid(name: &str) -> bool {
    !name.chars().any(|c| c.is_whitespace() || c == '.')
}

/// Walk a directory tree, yielding every directory whose name is valid.
///
/// The root itself is always yielded. Directories with invalid names are
/// pruned along with all their descendants. Entries are visited parents
/// first, siblings in file name order.
pub fn valid_dirs(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || is_name_valid(&entry.file_name().to_string_lossy())
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
}

/// List the regular files directly inside a directory, sorted by name.
pub fn files_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Read a file that is allowed to be absent.
///
/// Returns `Ok(None)` when the file does not exist; every other failure is
/// returned to the caller.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
