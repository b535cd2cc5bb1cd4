use std::path::PathBuf;

use crate::config::ConfigParseError;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("required baseline dependency `{0}` is not in the dependency set")]
    MissingDependency(String),

    #[error(transparent)]
    Archive(#[from] pod_format::Error),

    #[error("cannot use `{name}` as an entry name")]
    InvalidName {
        name: String,
        #[source]
        source: pod_format::path::EntryPathError,
    },

    #[error(transparent)]
    Config(#[from] ConfigParseError),

    #[error("cannot read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> BuildError {
        BuildError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> BuildError {
        BuildError::Write {
            path: path.into(),
            source,
        }
    }
}
