use std::fmt;
use std::path::{Path, PathBuf};

/// The separator used in entry names, regardless of host OS.
pub const ENTRY_SEP: char = '/';

/// A validated, NFC-normalised entry name: forward-slash separated,
/// relative, with no escape tricks left in.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntryPath(pub(crate) String);

#[derive(Debug, Clone, thiserror::Error)]
pub enum EntryPathError {
    #[error("unrepresentable string found in path")]
    UnrepresentableStr,
    #[error("no path provided")]
    EmptyPath,
}

/// Reduce a host path to clean entry name components: `.`, roots and
/// prefixes vanish, `..` pops, and each normal component must survive
/// [`clean_component`]. Returns `None` if any component is unusable.
pub fn sanitize<P: AsRef<Path>>(path: P) -> Option<Vec<String>> {
    use std::path::Component;

    let mut out = vec![];

    for component in path.as_ref().components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(os_str) => {
                let cleaned = clean_component(os_str.to_str()?)?;
                out.push(cleaned);
            }
        }
    }

    Some(out)
}

/// Trimmed, NFC-normalised component, or `None` when it is empty or
/// contains a backslash, a control character, or a non-space separator.
fn clean_component(component: &str) -> Option<String> {
    use unic_normal::StrNormalForm;
    use unic_ucd::GeneralCategory;

    let component = component.trim();
    if component.is_empty() {
        return None;
    }
    for c in component.chars() {
        let cat = GeneralCategory::of(c);
        if c == '\\' || cat == GeneralCategory::Control || (cat.is_separator() && c != ' ') {
            return None;
        }
    }
    Some(component.nfc().collect())
}

impl EntryPath {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<EntryPath, EntryPathError> {
        let out = sanitize(&path).ok_or(EntryPathError::UnrepresentableStr)?;

        if out.is_empty() {
            return Err(EntryPathError::EmptyPath);
        }

        Ok(EntryPath(out.join("/")))
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.iter().collect()
    }

    pub fn parent(&self) -> Option<EntryPath> {
        let mut parts: Vec<_> = self.iter().collect();
        if parts.len() == 1 {
            return None;
        }
        parts.pop();
        Some(EntryPath(parts.join("/")))
    }

    pub fn filename(&self) -> &str {
        self.iter().next_back().unwrap_or(&self.0)
    }

    pub fn depth(&self) -> usize {
        self.0.chars().filter(|c| c == &ENTRY_SEP).count()
    }

    /// True when this path names `prefix` itself or anything below it.
    pub fn is_under(&self, prefix: &str) -> bool {
        match self.0.strip_prefix(prefix) {
            Some("") => true,
            Some(rest) => rest.starts_with(ENTRY_SEP),
            None => false,
        }
    }

    pub fn join<P: AsRef<Path>>(&self, tail: P) -> Result<EntryPath, EntryPathError> {
        Self::new(self.to_path_buf().join(tail))
    }

    pub fn iter(&self) -> std::str::Split<'_, char> {
        self.0.split(ENTRY_SEP)
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitisation() {
        let path = EntryPath::new("/something/../somethingelse/./foo.txt").unwrap();
        assert_eq!(path.0, "somethingelse/foo.txt");
        let path = EntryPath::new("../something/../somethingelse/./foo.txt/.").unwrap();
        assert_eq!(path.0, "somethingelse/foo.txt");
    }

    #[test]
    fn sanitisation_null() {
        assert!(EntryPath::new("\0").is_err());
    }

    #[test]
    fn sanitisation_empty() {
        assert!(EntryPath::new("").is_err());
        assert!(EntryPath::new("/").is_err());
    }

    #[test]
    fn sanitisation_double_slash() {
        let path = EntryPath::new("/cant/hate//the/path").unwrap();
        assert_eq!(path.0, "cant/hate/the/path");
    }

    #[test]
    fn sanitisation_backslash() {
        #[cfg(not(windows))]
        assert!(EntryPath::new(r"some\thing").is_err());
    }

    #[test]
    fn never_starts_with_separator() {
        let path = EntryPath::new("///deeply//rooted").unwrap();
        assert!(!path.as_str().starts_with('/'));
        assert_eq!(path.0, "deeply/rooted");
    }

    #[test]
    fn prefix_matching() {
        let path = EntryPath::new("bootstrap/runtime.conf").unwrap();
        assert!(path.is_under("bootstrap"));
        assert!(path.is_under("bootstrap/runtime.conf"));
        assert!(!path.is_under("boot"));
        assert!(!path.is_under("bootstrap/runtime"));
    }

    #[test]
    fn parents_and_filenames() {
        let path = EntryPath::new("a/b/c.rbc").unwrap();
        assert_eq!(path.filename(), "c.rbc");
        assert_eq!(path.parent().unwrap().as_str(), "a/b");
        assert_eq!(path.depth(), 2);
        assert!(EntryPath::new("solo").unwrap().parent().is_none());
    }
}
