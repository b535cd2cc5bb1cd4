use std::num::NonZeroU64;

/// File extension used for pod archives.
pub const POD_EXTENSION: &str = "pod";

// Make some attempt to not accidentally load plain text files,
// and also make it break almost immediately in any UTF-8 compliant text parser.
pub(crate) const MAGIC_BYTES: &[u8; 4] = b"\xffPOD";

/// Current on-disk format version.
pub const FORMAT_VERSION: u8 = 1;

#[derive(Debug)]
pub(crate) struct PodHeader {
    pub(crate) version: u8,
    pub(crate) trailer: Option<NonZeroU64>,
}

impl PodHeader {
    /// Size of the serialized header in bytes: magic, version, three
    /// reserved bytes, trailer offset.
    pub(crate) const SIZE: usize = 16;

    pub(crate) fn new(trailer: Option<NonZeroU64>) -> PodHeader {
        PodHeader {
            version: FORMAT_VERSION,
            trailer,
        }
    }
}

impl Default for PodHeader {
    fn default() -> Self {
        PodHeader::new(None)
    }
}
