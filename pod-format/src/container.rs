use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use memmap2::MmapOptions;

use crate::de;
use crate::entry::{Entry, Payload};
use crate::error::Error;
use crate::header::{PodHeader, FORMAT_VERSION};
use crate::path::EntryPath;
use crate::ser::{self, RawRecord, Serialize};
use crate::Result;

/// An ordered collection of uniquely named entries, loadable from and
/// persistable to a `.pod` archive.
///
/// Entry names are unique: adding a colliding name fails rather than
/// overwriting. Iteration order is insertion order, and `save` writes
/// payloads and the trailer directory in that same order, so a
/// save/open round trip preserves it.
#[derive(Debug, Default)]
pub struct Pod {
    path: Option<PathBuf>,
    version: u8,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Pod {
    /// An empty container with no backing file yet.
    pub fn new() -> Pod {
        Pod {
            path: None,
            version: FORMAT_VERSION,
            entries: vec![],
            index: HashMap::new(),
        }
    }

    /// Parse an existing archive's entry directory.
    ///
    /// Payloads are not loaded; each entry references its region of the
    /// backing file and is streamed on demand.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Pod> {
        let path = path
            .as_ref()
            .canonicalize()
            .map_err(|source| Error::read(path.as_ref(), source))?;

        let file = File::open(&path).map_err(|source| Error::read(&path, source))?;
        let file_len = file
            .metadata()
            .map_err(|source| Error::read(&path, source))?
            .len();

        let mut reader = BufReader::new(file);
        let header =
            de::read_header(&mut reader).map_err(|e| Error::corrupt(&path, e.to_string()))?;

        if header.version != FORMAT_VERSION {
            return Err(Error::corrupt(
                &path,
                format!("unsupported format version {}", header.version),
            ));
        }

        let trailer = NonZeroU64::new(header.trailer)
            .ok_or_else(|| Error::corrupt(&path, "no trailer found"))?;

        if trailer.get() >= file_len {
            return Err(Error::corrupt(&path, "trailer offset beyond end of file"));
        }

        reader
            .seek(SeekFrom::Start(trailer.get()))
            .map_err(|source| Error::read(&path, source))?;
        let records =
            de::read_trailer(&mut reader).map_err(|e| Error::corrupt(&path, e.to_string()))?;

        let mut pod = Pod {
            path: Some(path.clone()),
            version: header.version,
            entries: Vec::with_capacity(records.len()),
            index: HashMap::with_capacity(records.len()),
        };

        for record in records {
            let name = EntryPath::new(&record.name)
                .map_err(|e| Error::corrupt(&path, format!("bad entry name: {}", e)))?;
            if name.as_str() != record.name {
                return Err(Error::corrupt(
                    &path,
                    format!("non-canonical entry name `{}`", record.name),
                ));
            }

            let offset = NonZeroU64::new(record.offset)
                .ok_or_else(|| Error::corrupt(&path, "zero payload offset"))?;
            // checked: offset and length come straight from the file
            let end = offset.get().checked_add(record.length);
            if !matches!(end, Some(end) if end <= trailer.get()) {
                return Err(Error::corrupt(
                    &path,
                    format!("entry `{}` overruns the payload region", record.name),
                ));
            }

            let entry = Entry {
                name,
                payload: Payload::Stored {
                    archive: path.clone(),
                    offset,
                    length: record.length,
                },
            };
            if pod.push(entry).is_some() {
                return Err(Error::corrupt(
                    &path,
                    format!("duplicate entry name `{}` in directory", record.name),
                ));
            }
        }

        Ok(pod)
    }

    /// The backing file, if loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the displaced entry when the name was already taken.
    fn push(&mut self, entry: Entry) -> Option<Entry> {
        if self.index.contains_key(entry.name.as_str()) {
            return Some(entry);
        }
        self.index
            .insert(entry.name.as_str().to_string(), self.entries.len());
        self.entries.push(entry);
        None
    }

    /// Add a named payload. Fails with [`Error::DuplicateEntry`] when the
    /// name is already present; the container is unchanged on failure.
    pub fn add_entry(&mut self, name: EntryPath, payload: Payload) -> Result<()> {
        let entry = Entry { name, payload };
        match self.push(entry) {
            Some(entry) => Err(Error::DuplicateEntry(entry.name.as_str().to_string())),
            None => Ok(()),
        }
    }

    /// Add an on-disk file as an entry. The file is read when the
    /// container is saved or extracted, not now.
    pub fn add_file<P: AsRef<Path>>(&mut self, name: EntryPath, file: P) -> Result<()> {
        self.add_entry(name, Payload::File(file.as_ref().to_path_buf()))
    }

    /// Add an in-memory buffer as an entry.
    pub fn add_bytes(&mut self, name: EntryPath, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.add_entry(name, Payload::Memory(bytes.into()))
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// All entries, in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entries whose name equals `prefix` or lives underneath it.
    pub fn entries_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |e| e.name.is_under(prefix))
    }

    /// Copy every entry from `other` that does not collide with an
    /// existing name. Collisions are skipped, not overwritten: the first
    /// writer wins. Returns the number of entries copied.
    pub fn merge_from(&mut self, other: &Pod) -> usize {
        let mut copied = 0;
        for entry in other.entries() {
            if self.index.contains_key(entry.name.as_str()) {
                tracing::debug!(name = %entry.name, "entry already present, skipping");
                continue;
            }
            self.push(entry.clone());
            copied += 1;
        }
        copied
    }

    /// A streaming reader over an entry's payload. Stored and file
    /// payloads are read from disk without loading them whole.
    pub fn reader<'a>(&self, entry: &'a Entry) -> Result<PayloadReader<'a>> {
        let inner = match &entry.payload {
            Payload::Memory(bytes) => Inner::Memory(io::Cursor::new(bytes.as_slice())),
            Payload::File(path) => {
                let file = File::open(path).map_err(|source| Error::read(path, source))?;
                Inner::File(BufReader::new(file))
            }
            Payload::Stored {
                archive,
                offset,
                length,
            } => {
                let file = File::open(archive).map_err(|source| Error::read(archive, source))?;
                let mut reader = BufReader::new(file);
                reader
                    .seek(SeekFrom::Start(offset.get()))
                    .map_err(|source| Error::read(archive, source))?;
                Inner::Stored(reader.take(*length))
            }
        };
        Ok(PayloadReader(inner))
    }

    /// Zero-copy map of an entry's payload. Only payloads backed by a
    /// file on disk can be mapped; in-memory and zero-length payloads
    /// return `None`.
    pub fn memory_map(&self, entry: &Entry) -> Option<Result<memmap2::Mmap>> {
        match &entry.payload {
            Payload::Memory(_) => None,
            Payload::File(path) => {
                let map = File::open(path)
                    .and_then(|file| unsafe { MmapOptions::new().map(&file) })
                    .map_err(|source| Error::read(path, source));
                Some(map)
            }
            Payload::Stored {
                archive,
                offset,
                length,
            } => {
                if *length == 0 {
                    return None;
                }
                let map = File::open(archive)
                    .and_then(|file| unsafe {
                        MmapOptions::new()
                            .offset(offset.get())
                            .len(*length as usize)
                            .map(&file)
                    })
                    .map_err(|source| Error::read(archive, source));
                Some(map)
            }
        }
    }

    /// Read an entry's payload fully into memory.
    pub fn read_bytes(&self, entry: &Entry) -> Result<Vec<u8>> {
        let mut buf = match entry.payload.len() {
            Ok(len) => Vec::with_capacity(len as usize),
            Err(_) => Vec::new(),
        };
        let mut reader = self.reader(entry)?;
        reader
            .read_to_end(&mut buf)
            .map_err(|source| Error::read(self.payload_source(entry), source))?;
        Ok(buf)
    }

    fn payload_source(&self, entry: &Entry) -> PathBuf {
        match &entry.payload {
            Payload::File(path) => path.clone(),
            Payload::Stored { archive, .. } => archive.clone(),
            Payload::Memory(_) => PathBuf::from(entry.name.as_str()),
        }
    }

    /// Stream one payload into `dest`, returning the number of bytes
    /// written. Stored payloads are memory-mapped rather than seek-read.
    fn write_payload<W: Write>(&self, entry: &Entry, dest: &mut W) -> Result<u64> {
        match &entry.payload {
            Payload::Memory(bytes) => {
                dest.write_all(bytes)
                    .map_err(|source| Error::write(entry.name.to_path_buf(), source))?;
                Ok(bytes.len() as u64)
            }
            Payload::File(path) => {
                let file = File::open(path).map_err(|source| Error::read(path, source))?;
                let mut reader = BufReader::new(file);
                io::copy(&mut reader, dest).map_err(|source| Error::read(path, source))
            }
            Payload::Stored {
                archive,
                offset,
                length,
            } => {
                if *length == 0 {
                    return Ok(0);
                }
                let file = File::open(archive).map_err(|source| Error::read(archive, source))?;
                let mmap = unsafe {
                    MmapOptions::new()
                        .offset(offset.get())
                        .len(*length as usize)
                        .map(&file)
                }
                .map_err(|source| Error::read(archive, source))?;
                dest.write_all(&mmap)
                    .map_err(|source| Error::write(archive, source))?;
                Ok(*length)
            }
        }
    }

    /// Serialize all entries to `dest`, atomically replacing any prior
    /// content at that path. A container with zero entries cannot be
    /// saved: that is a configuration mistake, not an empty package.
    pub fn save<P: AsRef<Path>>(&self, dest: P) -> Result<()> {
        let dest = dest.as_ref();

        if self.entries.is_empty() {
            return Err(Error::EmptyArchive);
        }

        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|source| Error::write(dest, source))?;

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());

            PodHeader::new(None)
                .write(&mut writer)
                .map_err(|source| Error::write(dest, source))?;

            let mut locations = Vec::with_capacity(self.entries.len());
            let mut pos = PodHeader::SIZE as u64;
            for entry in &self.entries {
                let written = self.write_payload(entry, &mut writer)?;
                locations.push((pos, written));
                pos += written;
            }

            let records: Vec<RawRecord<'_>> = self
                .entries
                .iter()
                .zip(&locations)
                .map(|(entry, &(offset, length))| RawRecord {
                    name: entry.name.as_str(),
                    offset,
                    length,
                })
                .collect();

            ser::write_trailer(&mut writer, &records)
                .map_err(|source| Error::write(dest, source))?;

            writer
                .seek(SeekFrom::Start(0))
                .map_err(|source| Error::write(dest, source))?;
            PodHeader::new(NonZeroU64::new(pos))
                .write(&mut writer)
                .map_err(|source| Error::write(dest, source))?;
            writer
                .flush()
                .map_err(|source| Error::write(dest, source))?;
        }

        tmp.persist(dest)
            .map_err(|e| Error::write(dest, e.error))?;

        tracing::debug!(
            path = %dest.display(),
            entries = self.entries.len(),
            "saved pod"
        );

        Ok(())
    }

    /// Stream every entry's payload to `dest/<entry name>`, creating
    /// parent directories as needed. Fails fast: the first failing entry
    /// aborts the extraction.
    pub fn extract_all<P: AsRef<Path>>(&self, dest: P) -> Result<()> {
        let dest = dest.as_ref();
        for entry in &self.entries {
            self.extract_entry(entry, &dest.join(entry.name.to_path_buf()))?;
        }
        Ok(())
    }

    /// Extract only entries matching `prefix` (the entry itself, or
    /// anything under `prefix + "/"`), stripping the prefix from the
    /// destination path. An exact match lands directly under `dest`
    /// keeping only its file name. Returns the number of entries written.
    pub fn extract_prefix<P: AsRef<Path>>(&self, prefix: &str, dest: P) -> Result<usize> {
        let dest = dest.as_ref();
        let mut count = 0;

        for entry in self.entries.iter().filter(|e| e.name.is_under(prefix)) {
            let target = if entry.name.as_str() == prefix {
                dest.join(entry.name.filename())
            } else {
                let rest = &entry.name.as_str()[prefix.len() + 1..];
                rest.split('/').fold(dest.to_path_buf(), |p, c| p.join(c))
            };
            self.extract_entry(entry, &target)?;
            count += 1;
        }

        Ok(count)
    }

    fn extract_entry(&self, entry: &Entry, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::write(parent, source))?;
        }
        let file = File::create(target).map_err(|source| Error::write(target, source))?;
        let mut writer = BufWriter::new(file);
        self.write_payload(entry, &mut writer)?;
        writer
            .flush()
            .map_err(|source| Error::write(target, source))?;
        Ok(())
    }
}

enum Inner<'a> {
    Memory(io::Cursor<&'a [u8]>),
    File(BufReader<File>),
    Stored(io::Take<BufReader<File>>),
}

/// Streaming reader over one entry's payload.
pub struct PayloadReader<'a>(Inner<'a>);

impl Read for PayloadReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.0 {
            Inner::Memory(cursor) => cursor.read(buf),
            Inner::File(reader) => reader.read(buf),
            Inner::Stored(reader) => reader.read(buf),
        }
    }
}
