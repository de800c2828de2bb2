//! Slash-separated path values.
//!
//! `SlashPath` is an immutable list of path segments. Every structural
//! operation returns a new value, which keeps directory mirroring and
//! namespace computation free of `strip_prefix` bookkeeping.

use std::fmt;
use std::path::{Path, PathBuf};

/// An immutable, slash-separated path.
///
/// Absolute paths keep a leading empty segment so that `to_string()` puts the
/// leading slash back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SlashPath {
    segments: Vec<String>,
}

impl SlashPath {
    /// The empty path.
    pub fn new() -> Self {
        SlashPath::default()
    }

    /// Parse a path string.
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return SlashPath::default();
        }
        let segments = s
            .split('/')
            .enumerate()
            .filter(|(i, segment)| *i == 0 || !segment.is_empty())
            .map(|(_, segment)| segment.to_string())
            .collect();
        SlashPath { segments }
    }

    /// Number of segments, including the root marker of absolute paths.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        self.segments.first().is_some_and(|s| s.is_empty())
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a single segment. Trailing slashes are stripped and an empty
    /// segment leaves the path unchanged.
    pub fn append(&self, segment: &str) -> Self {
        let segment = segment.trim_end_matches('/');
        if segment.is_empty() {
            return self.clone();
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        SlashPath { segments }
    }

    /// Append every segment of another path.
    ///
    /// Appending to an empty path yields `other` unchanged, so an absolute
    /// path stays absolute.
    pub fn append_path(&self, other: &SlashPath) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().filter(|s| !s.is_empty()).cloned());
        SlashPath { segments }
    }

    /// Remove the first `n` segments.
    pub fn drop_first(&self, n: usize) -> Self {
        SlashPath {
            segments: self.segments.iter().skip(n).cloned().collect(),
        }
    }

    /// Remove the last `n` segments.
    pub fn drop_last(&self, n: usize) -> Self {
        let keep = self.segments.len().saturating_sub(n);
        SlashPath {
            segments: self.segments[..keep].to_vec(),
        }
    }

    /// Replace the segment at `index`. Out-of-range indices leave the path
    /// unchanged.
    pub fn replace(&self, index: usize, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        if let Some(slot) = segments.get_mut(index) {
            *slot = segment.trim_end_matches('/').to_string();
        }
        SlashPath { segments }
    }

    /// Whether this path names an existing directory.
    pub fn is_dir(&self) -> bool {
        self.to_path_buf().is_dir()
    }

    /// Whether this path names an existing file.
    pub fn is_file(&self) -> bool {
        self.to_path_buf().is_file()
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.to_string())
    }
}

impl fmt::Display for SlashPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.len() == 1 && self.is_absolute() {
            return write!(f, "/");
        }
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&str> for SlashPath {
    fn from(s: &str) -> Self {
        SlashPath::parse(s)
    }
}

impl From<&Path> for SlashPath {
    fn from(path: &Path) -> Self {
        SlashPath::parse(&path.to_string_lossy())
    }
}

impl From<&PathBuf> for SlashPath {
    fn from(path: &PathBuf) -> Self {
        SlashPath::from(path.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(SlashPath::parse("/ext/lib").to_string(), "/ext/lib");
        assert_eq!(SlashPath::parse("src/a/").to_string(), "src/a");
        assert_eq!(SlashPath::parse("a//b").len(), 2);
        assert!(SlashPath::parse("").is_empty());
        assert_eq!(SlashPath::parse("/").to_string(), "/");
    }

    #[test]
    fn test_append() {
        let p = SlashPath::new().append("src");
        assert_eq!(p.to_string(), "src");
        assert_eq!(p.append("").to_string(), "src");
        assert_eq!(p.append("Foo.v").to_string(), "src/Foo.v");
        assert_eq!(
            SlashPath::parse("/a").append_path(&SlashPath::parse("b/c")).to_string(),
            "/a/b/c"
        );
        assert_eq!(
            SlashPath::new().append_path(&SlashPath::parse("/abs/src")).to_string(),
            "/abs/src"
        );
    }

    #[test]
    fn test_mirror_relative_directory() {
        let src_root = SlashPath::parse("/p/src");
        let current = SlashPath::parse("/p/src/a/b");
        let relative = current.drop_first(src_root.len());
        assert_eq!(relative.segments().collect::<Vec<_>>(), vec!["a", "b"]);

        let mirrored = SlashPath::parse("/p/bin").append_path(&relative);
        assert_eq!(mirrored.to_string(), "/p/bin/a/b");
    }

    #[test]
    fn test_drop_last_and_replace() {
        let p = SlashPath::parse("a/b/c");
        assert_eq!(p.drop_last(1).to_string(), "a/b");
        assert_eq!(p.drop_last(5).to_string(), "");
        assert_eq!(p.replace(1, "x/").to_string(), "a/x/c");
        assert_eq!(p.replace(9, "x").to_string(), "a/b/c");
        assert_eq!(p.first(), Some("a"));
        assert_eq!(p.last(), Some("c"));
    }
}
