use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use fastvlq::WriteVu64Ext;

use crate::header::{PodHeader, MAGIC_BYTES};

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;
}

impl Serialize for str {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_vu64(self.len() as u64)?;
        writer.write_all(self.as_bytes())
    }
}

impl Serialize for PodHeader {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(MAGIC_BYTES)?;
        writer.write_u8(self.version)?;
        writer.write_all(&[0u8; 3])?; // reserved
        writer.write_u64::<LittleEndian>(self.trailer.map(|x| x.get()).unwrap_or(0))
    }
}

/// A directory record as written to the trailer: the payload location is
/// only known once the payload has been streamed out.
pub(crate) struct RawRecord<'a> {
    pub(crate) name: &'a str,
    pub(crate) offset: u64,
    pub(crate) length: u64,
}

impl Serialize for RawRecord<'_> {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name.write(writer)?;
        writer.write_u64::<LittleEndian>(self.offset)?;
        writer.write_u64::<LittleEndian>(self.length)
    }
}

pub(crate) fn write_trailer<W: Write>(
    writer: &mut W,
    records: &[RawRecord<'_>],
) -> std::io::Result<()> {
    writer.write_vu64(records.len() as u64)?;
    for record in records {
        record.write(writer)?;
    }
    Ok(())
}
