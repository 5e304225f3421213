//! EDF archive container structures and parsing.
//!
//! The on-disk layout is three contiguous regions, little-endian
//! throughout:
//!
//! | Region | Size | Contents |
//! |--------|------|----------|
//! | Header | 16 bytes | magic `"EDFA"`, version, entry count, reserved |
//! | Index  | 20 bytes x count | one [`Descriptor`] per entry |
//! | Data   | variable | concatenated stored runs, index order, no padding |
//!
//! Descriptor offsets are relative to the start of the data region, so the
//! index can be rewritten without touching stored runs.

mod header;
mod index;

pub use header::Header;
pub use index::Descriptor;

/// Magic bytes at the start of every EDF archive.
pub const MAGIC: [u8; 4] = *b"EDFA";

/// The format version this build reads and writes.
pub const VERSION: u16 = 1;

/// Size of the fixed header region in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of one index descriptor in bytes.
pub const DESCRIPTOR_SIZE: usize = 20;
