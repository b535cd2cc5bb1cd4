//! The "project path file": an ordered list of filesystem paths and
//! archive references, read by the runtime loader at program start.
//!
//! An entry prefixed with `!` is an override: the loader consults it
//! before any non-marked entry of the same logical artifact, so override
//! entries always sit at the front of the list.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::BuildError;
use crate::Result;

/// Marks an entry as taking precedence over non-marked entries.
pub const OVERRIDE_MARKER: char = '!';

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathEntry {
    path: String,
    is_override: bool,
}

/// An ordered, deduplicated list of path entries with an optional
/// leading comment.
#[derive(Debug, Clone, Default)]
pub struct PathList {
    comment: Option<String>,
    // Override entries occupy indices 0..overrides, each region in add order.
    entries: Vec<PathEntry>,
    overrides: usize,
}

impl PathList {
    pub fn new() -> PathList {
        PathList::default()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Append a plain entry. Duplicate path strings are silently
    /// dropped; the first add wins and keeps its marker.
    pub fn add(&mut self, path: impl Into<String>) {
        self.insert(path.into(), false);
    }

    /// Add an override entry at the back of the override region.
    pub fn add_override(&mut self, path: impl Into<String>) {
        self.insert(path.into(), true);
    }

    fn insert(&mut self, path: String, is_override: bool) {
        if self.entries.iter().any(|e| e.path == path) {
            tracing::debug!(%path, "duplicate path entry, dropping");
            return;
        }
        let entry = PathEntry { path, is_override };
        if is_override {
            self.entries.insert(self.overrides, entry);
            self.overrides += 1;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Entries as `(path, is_override)` pairs, override region first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|e| (e.path.as_str(), e.is_override))
    }

    /// Parse a path file written by [`PathList::save`] (or by hand).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<PathList> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|source| BuildError::read(path, source))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> PathList {
        let mut list = PathList::new();
        let mut lines = text.lines().peekable();

        if let Some(first) = lines.peek() {
            if let Some(comment) = first.strip_prefix('#') {
                list.comment = Some(comment.trim().to_string());
                lines.next();
            }
        }

        for line in lines {
            let line = line.trim();
            // stray comment lines in hand-edited files are skipped
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.strip_prefix(OVERRIDE_MARKER) {
                Some(path) => list.insert(path.to_string(), true),
                None => list.insert(line.to_string(), false),
            }
        }

        list
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if let Some(comment) = &self.comment {
            writeln!(writer, "# {}", comment)?;
        }
        for entry in &self.entries {
            if entry.is_override {
                writeln!(writer, "{}{}", OVERRIDE_MARKER, entry.path)?;
            } else {
                writeln!(writer, "{}", entry.path)?;
            }
        }
        Ok(())
    }

    /// Write the list as UTF-8 text. May be called again after further
    /// mutation; each call serialises the current state.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| BuildError::write(path, source))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|source| BuildError::write(path, source))
    }
}

impl fmt::Display for PathList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8(buf).map_err(|_| fmt::Error)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(list: &PathList) -> Vec<String> {
        list.entries()
            .map(|(path, is_override)| {
                if is_override {
                    format!("!{}", path)
                } else {
                    path.to_string()
                }
            })
            .collect()
    }

    #[test]
    fn overrides_go_to_the_front() {
        let mut list = PathList::new();
        list.add("a");
        list.add_override("b");
        list.add("c");
        assert_eq!(lines(&list), ["!b", "a", "c"]);
    }

    #[test]
    fn override_region_keeps_add_order() {
        let mut list = PathList::new();
        list.add("normal");
        list.add_override("first");
        list.add_override("second");
        assert_eq!(lines(&list), ["!first", "!second", "normal"]);
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut list = PathList::new();
        list.add("x");
        list.add("x");
        assert_eq!(list.len(), 1);

        // first add wins, marker included
        list.add_override("x");
        assert_eq!(lines(&list), ["x"]);
    }

    #[test]
    fn round_trip_through_text() {
        let mut list = PathList::new();
        list.set_comment("runtime path file");
        list.add("classes");
        list.add_override("libs/fix-1.0-patch.pod");
        list.add("libs/extra-2.1.pod");

        let text = list.to_string();
        assert_eq!(
            text,
            "# runtime path file\n!libs/fix-1.0-patch.pod\nclasses\nlibs/extra-2.1.pod\n"
        );

        let parsed = PathList::parse(&text);
        assert_eq!(parsed.comment(), Some("runtime path file"));
        assert_eq!(lines(&parsed), lines(&list));
    }

    #[test]
    fn stray_comment_lines_are_skipped() {
        let parsed = PathList::parse(
            "# the real comment\nclasses\n# a note someone left\n!libs/patch.pod\n",
        );
        assert_eq!(parsed.comment(), Some("the real comment"));
        assert_eq!(lines(&parsed), ["!libs/patch.pod", "classes"]);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.pods");

        let mut list = PathList::new();
        list.add("classes");
        list.add_override("libs/patch.pod");
        list.save(&path).unwrap();

        let loaded = PathList::load(&path).unwrap();
        assert_eq!(lines(&loaded), ["!libs/patch.pod", "classes"]);
    }
}
