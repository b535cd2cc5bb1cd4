//! Assembles one pod package per build phase from compiled output,
//! resources and resolved dependencies, then persists it as the phase's
//! artifact.

use std::path::{Path, PathBuf};

use pod_format::{EntryPath, Pod, POD_EXTENSION};

use crate::config::ConfigFile;
use crate::dependency::{Dependency, BASELINE_GROUP};
use crate::error::BuildError;
use crate::pathlist::PathList;
use crate::Result;

/// Entry name of the generated package manifest.
pub const MANIFEST_ENTRY: &str = "meta/manifest.conf";

/// Entry name of the generated runtime path file.
pub const PATH_FILE_ENTRY: &str = "project.pods";

/// Identifier written into the manifest's `format` property.
pub const FORMAT_ID: &str = "pod/1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Classes at the container root; dependencies flattened in when
    /// packing is requested.
    Library,
    /// Classes under `classes/`, resources, runtime and libraries laid
    /// out for the runtime loader, plus a generated path file.
    Application,
}

#[derive(Debug, Clone)]
pub struct ResourceMapping {
    pub source: PathBuf,
    pub prefix: String,
}

/// Everything one packaging invocation needs, built once per phase and
/// then read-only.
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub name: String,
    pub classifier: Option<String>,
    pub strategy: Strategy,
    pub classes_dir: PathBuf,
    pub pack_dependencies: bool,
    pub pack_runtime: bool,
    pub resources: Vec<ResourceMapping>,
    pub main: Option<String>,
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AssembleConfig {
    /// `<name>.pod`, or `<name>-<classifier>.pod` when classified.
    pub fn output_file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}-{}.{}", self.name, classifier, POD_EXTENSION),
            None => format!("{}.{}", self.name, POD_EXTENSION),
        }
    }
}

#[derive(Debug)]
pub struct BuiltPackage {
    pub path: PathBuf,
    pub entries: usize,
}

/// Run one packaging invocation: populate a container per the selected
/// strategy, generate the manifest (and, for applications, the path
/// file), and save the result into the output directory.
///
/// Nothing is committed until the final save; a failure anywhere leaves
/// the output path untouched.
pub fn assemble(config: &AssembleConfig, deps: &[Dependency]) -> Result<BuiltPackage> {
    let mut pod = Pod::new();

    match config.strategy {
        Strategy::Library => assemble_library(&mut pod, config, deps)?,
        Strategy::Application => assemble_application(&mut pod, config, deps)?,
    }

    add_manifest(&mut pod, config)?;

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|source| BuildError::write(&config.output_dir, source))?;
    let output = config.output_dir.join(config.output_file_name());
    pod.save(&output)?;

    tracing::debug!(
        path = %output.display(),
        entries = pod.len(),
        "assembled package"
    );

    Ok(BuiltPackage {
        path: output,
        entries: pod.len(),
    })
}

fn assemble_library(pod: &mut Pod, config: &AssembleConfig, deps: &[Dependency]) -> Result<()> {
    add_tree(pod, &config.classes_dir, None)?;

    if config.pack_dependencies {
        for dep in deps {
            if !dep.is_pod() {
                tracing::warn!(dep = %dep.id(), "not a pod archive, cannot flatten");
                continue;
            }
            let source = Pod::open(&dep.file)?;
            let copied = pod.merge_from(&source);
            tracing::debug!(dep = %dep.id(), copied, "flattened dependency");
        }
    }

    Ok(())
}

fn assemble_application(
    pod: &mut Pod,
    config: &AssembleConfig,
    deps: &[Dependency],
) -> Result<()> {
    add_tree(pod, &config.classes_dir, Some("classes"))?;

    for mapping in &config.resources {
        add_tree(pod, &mapping.source, Some(&mapping.prefix))?;
    }

    let mut path_file = PathList::new();
    path_file.set_comment(format!("generated for {}", config.name));
    path_file.add("classes");

    if config.pack_runtime {
        for artifact in ["reed-base", "reed-tools"] {
            let dep = deps
                .iter()
                .find(|d| d.is_pod() && d.group == BASELINE_GROUP && d.artifact == artifact)
                .ok_or_else(|| {
                    BuildError::MissingDependency(format!("{}:{}", BASELINE_GROUP, artifact))
                })?;

            let name = entry_name(&format!("runtime/lib/{}", file_name(&dep.file)))?;
            path_file.add(name.as_str().to_string());
            pod.add_file(name, &dep.file)?;

            // the loader needs these entries on disk before any pod can
            // be opened, so they travel unpacked
            let source = Pod::open(&dep.file)?;
            for entry in source.entries_with_prefix("bootstrap") {
                let lifted = entry_name(&format!("runtime/{}", entry.name()))?;
                if pod.entry(lifted.as_str()).is_some() {
                    tracing::debug!(name = %lifted, "bootstrap entry already present, skipping");
                    continue;
                }
                pod.add_entry(lifted, entry.payload().clone())?;
            }
        }
    }

    if config.pack_dependencies {
        for dep in deps {
            if !dep.is_pod() {
                tracing::warn!(dep = %dep.id(), "not a pod archive, skipping");
                continue;
            }
            if dep.is_baseline() {
                tracing::debug!(dep = %dep.id(), "baseline artifact, supplied via runtime");
                continue;
            }

            let name = entry_name(&format!("libs/{}", file_name(&dep.file)))?;
            if dep.is_patch() {
                path_file.add_override(name.as_str().to_string());
            } else {
                path_file.add(name.as_str().to_string());
            }
            pod.add_file(name, &dep.file)?;
        }
    }

    pod.add_bytes(entry_name(PATH_FILE_ENTRY)?, path_file.to_string())?;

    Ok(())
}

fn add_manifest(pod: &mut Pod, config: &AssembleConfig) -> Result<()> {
    let mut manifest = ConfigFile::new();
    manifest.set_comment("pod package manifest");
    manifest.set_property("group", &config.group);
    manifest.set_property("artifact", &config.artifact);
    manifest.set_property("version", &config.version);
    manifest.set_property("name", &config.name);
    if let Some(classifier) = &config.classifier {
        manifest.set_property("classifier", classifier);
    }
    if let Some(main) = &config.main {
        manifest.set_property("main", main);
    }

    let generator = manifest.section_mut("generator");
    generator.set("by", generated_by());
    generator.set(
        "at",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    generator.set("format", FORMAT_ID);

    pod.add_bytes(entry_name(MANIFEST_ENTRY)?, manifest.to_string())?;
    Ok(())
}

fn generated_by() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
    format!("{}@{}", user, host)
}

/// Add every file under `dir` to the container, optionally under an
/// archive prefix. A missing directory is skipped; unreadable entries
/// are logged and skipped.
fn add_tree(pod: &mut Pod, dir: &Path, prefix: Option<&str>) -> Result<usize> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "directory absent, nothing to add");
        return Ok(0);
    }

    let mut added = 0;
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "unreadable entry, skipping");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let rel = match path.strip_prefix(dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let name = match prefix {
            Some(prefix) => Path::new(prefix).join(rel),
            None => rel.to_path_buf(),
        };
        let name = EntryPath::new(&name).map_err(|source| BuildError::InvalidName {
            name: name.display().to_string(),
            source,
        })?;
        pod.add_file(name, &path)?;
        added += 1;
    }

    tracing::debug!(dir = %dir.display(), added, "added directory tree");
    Ok(added)
}

fn entry_name(name: &str) -> Result<EntryPath> {
    EntryPath::new(name).map_err(|source| BuildError::InvalidName {
        name: name.to_string(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
