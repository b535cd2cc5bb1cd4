use std::path::PathBuf;

use crate::path::EntryPathError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a valid pod archive `{}`: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("duplicate entry name `{0}`")]
    DuplicateEntry(String),

    #[error("refusing to save a pod with no entries")]
    EmptyArchive,

    #[error("invalid entry name")]
    InvalidName(#[from] EntryPathError),

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

impl Error {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Error {
        Error::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}
