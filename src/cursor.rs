//! Bounds-checked sequential byte reading and writing.
//!
//! [`ByteReader`] walks a borrowed byte slice with a single monotonically
//! advancing position; every read is bounds-checked and fails with
//! [`Error::TruncatedInput`] instead of panicking. [`ByteWriter`] appends to
//! an owned buffer, growable by default or capped via
//! [`with_capacity_limit`][ByteWriter::with_capacity_limit], in which case
//! an oversized write fails with [`Error::BufferOverflow`].
//!
//! All multi-byte integers are little-endian, as the EDF format defines.

use crate::{Error, Result};

/// A bounds-checked sequential reader over a byte slice.
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position, in bytes from the start of the slice.
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads `n` bytes, advancing the position.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::TruncatedInput {
                offset: self.position(),
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Reads a little-endian 3-byte unsigned integer.
    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.read_bytes(3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// A sequential writer appending to an owned byte buffer.
///
/// The default writer grows without bound; a capacity-limited writer
/// refuses writes that would exceed the limit, leaving the buffer
/// unchanged.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    capacity_limit: Option<usize>,
}

impl ByteWriter {
    /// Creates a growable writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer that fails once `capacity` bytes have been written.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity_limit: Some(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(cap) = self.capacity_limit {
            let requested = self.buf.len() + bytes.len();
            if requested > cap {
                return Err(Error::BufferOverflow {
                    capacity: cap,
                    requested,
                });
            }
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Appends a single byte.
    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_bytes(&[v])
    }

    /// Appends a little-endian `u16`.
    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Appends a little-endian 3-byte unsigned integer.
    ///
    /// Values must fit in 24 bits; the serialization layer range-checks
    /// field widths before writing.
    pub fn write_u24(&mut self, v: u32) -> Result<()> {
        debug_assert!(v <= 0x00FF_FFFF);
        self.write_bytes(&v.to_le_bytes()[..3])
    }

    /// Appends a little-endian `u32`.
    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Consumes the writer and returns the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Borrows the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
