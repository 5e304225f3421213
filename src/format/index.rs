//! Index descriptors: the per-entry records locating stored runs.

use crate::cursor::{ByteReader, ByteWriter};
use crate::Result;

/// One 20-byte index record.
///
/// Layout: `u32` data-region-relative offset, `u32` stored length, `u32`
/// declared (decoded) length, `u32` CRC-32 of the decoded payload, `u8`
/// flag bits, 3 reserved bytes (written as zero, ignored on read).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Byte offset of the stored run, relative to the data region start.
    pub offset: u32,
    /// Length of the stored (encoded) run in bytes.
    pub stored_len: u32,
    /// Length of the decoded payload in bytes.
    pub declared_len: u32,
    /// CRC-32 checksum of the decoded payload.
    pub crc32: u32,
    /// Storage flag bits, see [`crate::codec`].
    pub flags: u8,
}

impl Descriptor {
    /// Parses one descriptor from the index region.
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self> {
        let offset = reader.read_u32()?;
        let stored_len = reader.read_u32()?;
        let declared_len = reader.read_u32()?;
        let crc32 = reader.read_u32()?;
        let flags = reader.read_u8()?;
        reader.read_bytes(3)?; // reserved

        Ok(Self {
            offset,
            stored_len,
            declared_len,
            crc32,
            flags,
        })
    }

    /// Serializes one descriptor.
    pub fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u32(self.offset)?;
        writer.write_u32(self.stored_len)?;
        writer.write_u32(self.declared_len)?;
        writer.write_u32(self.crc32)?;
        writer.write_u8(self.flags)?;
        writer.write_bytes(&[0u8; 3])?;
        Ok(())
    }

    /// Exclusive end of this descriptor's byte range in the data region.
    /// Computed in `u64` so the sum cannot overflow.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.stored_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::format::DESCRIPTOR_SIZE;

    #[test]
    fn parse_write_roundtrip() {
        let desc = Descriptor {
            offset: 0x1000,
            stored_len: 321,
            declared_len: 400,
            crc32: 0xdead_beef,
            flags: 0x07,
        };
        let mut w = ByteWriter::new();
        desc.write(&mut w).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), DESCRIPTOR_SIZE);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(Descriptor::parse(&mut r).unwrap(), desc);
    }

    #[test]
    fn rejects_truncated_descriptor() {
        let bytes = [0u8; DESCRIPTOR_SIZE - 1];
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(
            Descriptor::parse(&mut r),
            Err(Error::TruncatedInput { .. })
        ));
    }

    #[test]
    fn end_does_not_overflow() {
        let desc = Descriptor {
            offset: u32::MAX,
            stored_len: u32::MAX,
            declared_len: 0,
            crc32: 0,
            flags: 0,
        };
        assert_eq!(desc.end(), u64::from(u32::MAX) * 2);
    }
}
