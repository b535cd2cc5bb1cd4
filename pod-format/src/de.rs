use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use fastvlq::ReadVu64Ext;

use crate::header::MAGIC_BYTES;

pub(crate) struct RawHeader {
    pub(crate) version: u8,
    pub(crate) trailer: u64,
}

pub(crate) fn read_header<R: Read>(reader: &mut R) -> std::io::Result<RawHeader> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;

    if &magic != MAGIC_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "magic bytes invalid",
        ));
    }

    let version = reader.read_u8()?;
    reader.read_exact(&mut [0u8; 3])?; // skip reserved
    let trailer = reader.read_u64::<LittleEndian>()?;

    tracing::debug!(version, trailer, "read header");

    Ok(RawHeader { version, trailer })
}

fn read_string<R: Read>(reader: &mut R) -> std::io::Result<String> {
    let len = reader.read_vu64()?;
    if len > u32::MAX as u64 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unreasonable string length: {}", len),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

pub(crate) struct RawRecord {
    pub(crate) name: String,
    pub(crate) offset: u64,
    pub(crate) length: u64,
}

pub(crate) fn read_trailer<R: Read>(reader: &mut R) -> std::io::Result<Vec<RawRecord>> {
    let count = reader.read_vu64()?;
    let mut records = Vec::with_capacity(count.min(4096) as usize);

    for _ in 0..count {
        let name = read_string(reader)?;
        let offset = reader.read_u64::<LittleEndian>()?;
        let length = reader.read_u64::<LittleEndian>()?;
        records.push(RawRecord {
            name,
            offset,
            length,
        });
    }

    tracing::debug!(count, "read trailer");

    Ok(records)
}
