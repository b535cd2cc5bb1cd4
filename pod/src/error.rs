use std::path::PathBuf;

use miette::Diagnostic;
use pod_format::path::EntryPathError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Cannot handle path `{}`", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: EntryPathError,
    },

    #[error("Cannot open archive `{}`", .path.display())]
    #[diagnostic(help("Is this a valid .pod file?"))]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: pod_format::Error,
    },

    #[error("Cannot create archive `{}`", .path.display())]
    CreateArchive {
        path: PathBuf,
        #[source]
        source: pod_format::Error,
    },

    #[error("Cannot add file to archive `{}`", .path.display())]
    AddFile {
        path: PathBuf,
        #[source]
        source: pod_format::Error,
    },

    #[error("Cannot process directory entry")]
    ProcessDirEntry {
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot extract files")]
    Extract {
        #[source]
        source: pod_format::Error,
    },

    #[error("Cannot read entry `{name}`")]
    ReadEntry {
        name: String,
        #[source]
        source: pod_format::Error,
    },

    #[error("Archive already exists: `{}`", path.display())]
    #[diagnostic(help("Use -f/--force to overwrite"))]
    ArchiveExists { path: PathBuf },
}
