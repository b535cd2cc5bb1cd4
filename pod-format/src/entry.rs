use std::num::NonZeroU64;
use std::path::PathBuf;

use crate::path::EntryPath;

/// One named payload inside a container. Immutable once added.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) name: EntryPath,
    pub(crate) payload: Payload,
}

impl Entry {
    #[inline(always)]
    pub fn name(&self) -> &EntryPath {
        &self.name
    }

    #[inline(always)]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// Where an entry's bytes live until (and after) the container is saved.
#[derive(Debug, Clone)]
pub enum Payload {
    /// An in-memory buffer.
    Memory(Vec<u8>),

    /// A file on disk, read when the container is saved or extracted.
    File(PathBuf),

    /// A region of an existing pod archive. Carries the archive path so
    /// entries lifted into another container stay readable after the
    /// source [`crate::Pod`] is dropped.
    Stored {
        archive: PathBuf,
        offset: NonZeroU64,
        length: u64,
    },
}

impl Payload {
    /// Payload length in bytes. Queries the filesystem for `File` payloads.
    pub fn len(&self) -> std::io::Result<u64> {
        match self {
            Payload::Memory(bytes) => Ok(bytes.len() as u64),
            Payload::File(path) => Ok(std::fs::metadata(path)?.len()),
            Payload::Stored { length, .. } => Ok(*length),
        }
    }

    pub fn is_empty(&self) -> std::io::Result<bool> {
        Ok(self.len()? == 0)
    }
}
