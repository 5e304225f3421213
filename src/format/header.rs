//! The fixed-size archive header.

use crate::cursor::{ByteReader, ByteWriter};
use crate::{Error, Result};

use super::{HEADER_SIZE, MAGIC, VERSION};

/// The 16-byte header at the start of every EDF archive.
///
/// Layout: 4 magic bytes, `u16` version, `u16` entry count, 8 reserved
/// bytes (written as zero, ignored on read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Archive format version.
    pub version: u16,
    /// Number of index descriptors following the header.
    pub entry_count: u16,
}

impl Header {
    /// Parses the header from the front of an archive.
    ///
    /// # Errors
    ///
    /// - [`Error::TruncatedInput`] if fewer than 16 bytes are available
    /// - [`Error::InvalidMagic`] if the magic bytes do not match
    /// - [`Error::UnsupportedVersion`] if the version is outside the
    ///   supported range
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self> {
        let magic = reader.read_bytes(4)?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic {
                found: [magic[0], magic[1], magic[2], magic[3]],
            });
        }

        let version = reader.read_u16()?;
        if version == 0 || version > VERSION {
            return Err(Error::UnsupportedVersion { found: version });
        }

        let entry_count = reader.read_u16()?;
        reader.read_bytes(8)?; // reserved

        Ok(Self {
            version,
            entry_count,
        })
    }

    /// Serializes the header.
    ///
    /// The count field is always supplied by the caller from the live
    /// entry sequence; a cached count is never trusted.
    pub fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_bytes(&MAGIC)?;
        writer.write_u16(self.version)?;
        writer.write_u16(self.entry_count)?;
        writer.write_bytes(&[0u8; 8])?;
        debug_assert_eq!(writer.len() % HEADER_SIZE, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_write_roundtrip() {
        let header = Header {
            version: VERSION,
            entry_count: 12,
        };
        let mut w = ByteWriter::new();
        header.write(&mut w).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(Header::parse(&mut r).unwrap(), header);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(b"7zXZ");
        let mut r = ByteReader::new(&bytes);
        match Header::parse(&mut r) {
            Err(Error::InvalidMagic { found }) => assert_eq!(&found, b"7zXZ"),
            other => panic!("expected InvalidMagic, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut w = ByteWriter::new();
        w.write_bytes(&MAGIC).unwrap();
        w.write_u16(99).unwrap();
        w.write_u16(0).unwrap();
        w.write_bytes(&[0u8; 8]).unwrap();
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        match Header::parse(&mut r) {
            Err(Error::UnsupportedVersion { found }) => assert_eq!(found, 99),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn rejects_version_zero() {
        let mut w = ByteWriter::new();
        w.write_bytes(&MAGIC).unwrap();
        w.write_u16(0).unwrap();
        w.write_u16(0).unwrap();
        w.write_bytes(&[0u8; 8]).unwrap();
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        assert!(matches!(
            Header::parse(&mut r),
            Err(Error::UnsupportedVersion { found: 0 })
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        let mut r = ByteReader::new(&MAGIC);
        assert!(matches!(
            Header::parse(&mut r),
            Err(Error::TruncatedInput { .. })
        ));
    }
}
