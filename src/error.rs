//! Error types for EDF archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with EDF archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! All fallible operations in this crate return `Result<T, Error>`. Errors
//! carry enough context (entry index, byte offset) for a caller to present
//! an actionable message:
//!
//! ```rust,no_run
//! use edfarc::{Archive, Error};
//!
//! fn open(path: &str) -> edfarc::Result<()> {
//!     match Archive::open_path(path) {
//!         Ok(archive) => {
//!             println!("{} entries", archive.len());
//!             Ok(())
//!         }
//!         Err(Error::InvalidMagic { found }) => {
//!             eprintln!("not an EDF archive (magic {:02x?})", found);
//!             Err(Error::InvalidMagic { found })
//!         }
//!         Err(Error::UnsupportedVersion { found }) => {
//!             eprintln!("archive version {} is newer than this build", found);
//!             Err(Error::UnsupportedVersion { found })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;

/// The main error type for EDF archive operations.
///
/// Errors fall into several categories:
///
/// | Category | Variants | Typical cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations |
/// | Byte cursor | [`TruncatedInput`][Self::TruncatedInput], [`BufferOverflow`][Self::BufferOverflow] | Short reads, fixed-capacity sinks |
/// | Structural | [`InvalidMagic`][Self::InvalidMagic], [`UnsupportedVersion`][Self::UnsupportedVersion], [`CorruptArchive`][Self::CorruptArchive] | Damaged or foreign files |
/// | Entry-level | [`EntryDecode`][Self::EntryDecode], [`EntryNotFound`][Self::EntryNotFound] | Bad stored data, bad ordinals |
/// | Write path | [`Save`][Self::Save] | Refused or failed serialization |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input ended before a fixed-width read could complete.
    ///
    /// Reported by the byte cursor whenever fewer bytes remain than a
    /// read requires. The offset is the cursor position at the failed read.
    #[error("truncated input at offset {offset:#x}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Cursor position where the read was attempted.
        offset: u64,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes actually remaining.
        available: usize,
    },

    /// A write exceeded the capacity of a fixed-size sink.
    #[error("buffer overflow: capacity {capacity}, write would require {requested}")]
    BufferOverflow {
        /// Total capacity of the sink.
        capacity: usize,
        /// Bytes the sink would hold after the write.
        requested: usize,
    },

    /// The file does not start with the EDF archive magic bytes.
    #[error("invalid magic: expected \"EDFA\", found {found:02x?}")]
    InvalidMagic {
        /// The four bytes found where the magic was expected.
        found: [u8; 4],
    },

    /// The archive declares a format version outside the supported range.
    #[error("unsupported archive version {found} (supported: {})", crate::format::VERSION)]
    UnsupportedVersion {
        /// The version field read from the header.
        found: u16,
    },

    /// The archive structure is inconsistent and could not be loaded.
    ///
    /// Wraps header/index/descriptor problems detected during `load`.
    /// A partially loaded archive is never returned alongside this error.
    #[error("corrupt archive: {reason}")]
    CorruptArchive {
        /// A description of the structural inconsistency.
        reason: String,
    },

    /// An entry's stored bytes could not be decoded.
    ///
    /// Causes include malformed deflate streams, decoded-length
    /// disagreements, unknown flag bits, and checksum mismatches.
    #[error("entry {entry_index}: decode failed: {reason}")]
    EntryDecode {
        /// Ordinal of the entry that failed to decode.
        entry_index: usize,
        /// A description of the failure.
        reason: String,
    },

    /// A caller-supplied flag byte contains bits this build does not
    /// understand.
    #[error("entry {entry_index}: unknown flag bits in {flags:#04x}")]
    UnknownFlags {
        /// Ordinal of the entry the flags were meant for.
        entry_index: usize,
        /// The rejected flag byte.
        flags: u8,
    },

    /// An entry ordinal was out of range for the archive.
    #[error("entry {entry_index} not found (archive has {len} entries)")]
    EntryNotFound {
        /// The requested ordinal.
        entry_index: usize,
        /// Number of entries in the archive.
        len: usize,
    },

    /// The archive could not be saved.
    ///
    /// Returned when an entry fails to encode, when the live structure
    /// outgrows the on-disk field widths, or when unresolved fatal
    /// validator issues make writing unsafe. No partial output is
    /// produced alongside this error.
    #[error("save failed: {reason}")]
    Save {
        /// A description of the failure.
        reason: String,
    },
}

impl Error {
    /// Returns `true` if this error indicates data corruption rather than
    /// an environmental or usage problem.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::TruncatedInput { .. }
                | Error::InvalidMagic { .. }
                | Error::CorruptArchive { .. }
                | Error::EntryDecode { .. }
        )
    }
}

/// A specialized `Result` type for EDF archive operations.
pub type Result<T> = std::result::Result<T, Error>;
