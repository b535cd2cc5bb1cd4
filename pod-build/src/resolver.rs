//! Turns a dependency set plus user-declared extra paths into the
//! ordered, deduplicated list a path file or a compiler command line
//! wants.

use std::path::{Path, PathBuf};

use crate::dependency::Dependency;
use crate::pathlist::PathList;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Drop the baseline artifacts from the set before resolving. Used
    /// when they are supplied via the runtime bootstrap instead of the
    /// classpath.
    pub exclude_baseline: bool,
}

/// Resolve a classpath from dependencies and extra user paths.
///
/// Only pod-kind dependencies contribute; others are logged and
/// skipped. Patch-classified dependencies come out marked as overrides
/// at the front of the list. Exact-string duplicates collapse to the
/// earliest occurrence. Extra paths are absolutised against `base_dir`
/// and silently dropped when they do not exist on disk.
pub fn resolve_classpath(
    deps: &[Dependency],
    extra_paths: &[PathBuf],
    base_dir: &Path,
    options: ResolveOptions,
) -> PathList {
    let mut list = PathList::new();

    for dep in deps {
        if !dep.is_pod() {
            tracing::warn!(dep = %dep.id(), "not a pod archive, skipping");
            continue;
        }
        if options.exclude_baseline && dep.is_baseline() {
            tracing::debug!(dep = %dep.id(), "baseline artifact, supplied via bootstrap");
            continue;
        }

        let path = dep.file.display().to_string();
        if dep.is_patch() {
            list.add_override(path);
        } else {
            list.add(path);
        }
    }

    for path in resolve_source_roots(base_dir, extra_paths) {
        list.add(path.display().to_string());
    }

    list
}

/// Absolutise each root against `base_dir`, keeping only those that
/// exist. Order is preserved.
pub fn resolve_source_roots(base_dir: &Path, roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .filter_map(|root| {
            let abs = if root.is_absolute() {
                root.clone()
            } else {
                base_dir.join(root)
            };
            if abs.exists() {
                Some(abs)
            } else {
                tracing::warn!(path = %abs.display(), "declared path does not exist, dropping");
                None
            }
        })
        .collect()
}
