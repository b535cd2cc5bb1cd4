//! Packaging core for reed pod archives.
//!
//! This crate sits between a build orchestrator and [`pod_format`]: it
//! resolves dependency sets into ordered classpaths, writes the
//! path-list and ini-style manifest formats the runtime loader consumes,
//! and assembles finished `.pod` packages from compiled output.

mod assembler;
pub mod config;
mod dependency;
mod error;
pub mod pathlist;
mod resolver;

pub use assembler::{
    assemble, AssembleConfig, BuiltPackage, ResourceMapping, Strategy, FORMAT_ID, MANIFEST_ENTRY,
    PATH_FILE_ENTRY,
};
pub use dependency::{
    Dependency, DependencyKind, BASELINE_ARTIFACTS, BASELINE_GROUP, PATCH_CLASSIFIER,
};
pub use error::BuildError;
pub use pathlist::PathList;
pub use resolver::{resolve_classpath, resolve_source_roots, ResolveOptions};

pub type Result<T> = std::result::Result<T, BuildError>;
