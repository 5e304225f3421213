//! Length-prefixed deflate compression for stored entry runs.
//!
//! A compressed stored run is a little-endian `u32` holding the decoded
//! length, followed by a raw deflate stream. The explicit prefix lets the
//! decoder allocate exactly once and cross-check the stream against the
//! descriptor's declared length.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::bufread::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::cursor::{ByteReader, ByteWriter};
use crate::{Error, Result};

/// Compression level used for stored runs.
///
/// Level 6 is flate2's balanced default; archives are written once and
/// read many times, but entry payloads are small enough that higher
/// levels buy nothing measurable.
const LEVEL: u32 = 6;

/// Upper bound on the output buffer preallocated before inflating; a
/// hostile length field must not translate into a giant allocation.
const PREALLOC_LIMIT: usize = 1 << 20;

/// Compresses `decoded` into a length-prefixed deflate run.
pub fn compress(decoded: &[u8]) -> Result<Vec<u8>> {
    let mut out = ByteWriter::new();
    out.write_u32(decoded.len() as u32)?;

    let mut encoder = DeflateEncoder::new(out.into_inner(), Compression::new(LEVEL));
    encoder.write_all(decoded)?;
    Ok(encoder.finish()?)
}

/// Inflates a length-prefixed deflate run expected to decode to
/// `declared_len` bytes.
///
/// The prefix is checked against `declared_len` before any inflation, and
/// the decoder stops one byte past the declared length, so neither field
/// can be lied about to force a huge allocation. `entry_index` is carried
/// into error context. Fails with [`Error::EntryDecode`] if the run is too
/// short to hold the prefix, the prefix disagrees with `declared_len`, the
/// stream is malformed, or the inflated size disagrees with the prefix.
pub fn decompress(stored: &[u8], declared_len: u32, entry_index: usize) -> Result<Vec<u8>> {
    let mut reader = ByteReader::new(stored);
    let prefix = reader.read_u32().map_err(|_| Error::EntryDecode {
        entry_index,
        reason: format!(
            "compressed run of {} bytes is too short for its length prefix",
            stored.len()
        ),
    })?;
    if prefix != declared_len {
        return Err(Error::EntryDecode {
            entry_index,
            reason: format!(
                "length prefix declares {prefix} bytes but the descriptor declares {declared_len}"
            ),
        });
    }
    let decoded_len = prefix as usize;

    let mut decoded = Vec::with_capacity(decoded_len.min(PREALLOC_LIMIT));
    let mut decoder = DeflateDecoder::new(&stored[4..]).take(decoded_len as u64 + 1);
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| Error::EntryDecode {
            entry_index,
            reason: format!("malformed deflate stream: {e}"),
        })?;

    if decoded.len() != decoded_len {
        return Err(Error::EntryDecode {
            entry_index,
            reason: format!(
                "inflated to {} bytes but the length prefix declares {}",
                decoded.len(),
                decoded_len
            ),
        });
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_roundtrip() {
        let data = b"Hello, World! Hello, World! Hello, World!";
        let stored = compress(data).unwrap();
        assert_eq!(
            u32::from_le_bytes(stored[..4].try_into().unwrap()),
            data.len() as u32
        );
        assert_eq!(decompress(&stored, data.len() as u32, 0).unwrap(), data);
    }

    #[test]
    fn compress_empty_payload() {
        let stored = compress(b"").unwrap();
        assert_eq!(decompress(&stored, 0, 0).unwrap(), b"");
    }

    #[test]
    fn decompress_rejects_short_run() {
        let err = decompress(&[0x01, 0x02], 0, 3).unwrap_err();
        match err {
            Error::EntryDecode { entry_index, .. } => assert_eq!(entry_index, 3),
            other => panic!("expected EntryDecode, got {other:?}"),
        }
    }

    #[test]
    fn decompress_rejects_length_prefix_mismatch() {
        let mut stored = compress(b"abcdef").unwrap();
        // Claim one byte more than the descriptor declares.
        stored[..4].copy_from_slice(&7u32.to_le_bytes());
        let err = decompress(&stored, 6, 0).unwrap_err();
        assert!(err.to_string().contains("length prefix"));
    }

    #[test]
    fn oversized_length_prefix_fails_before_inflating() {
        // A run whose prefix and stream claim megabytes for an entry
        // declaring 10 bytes must be rejected on the prefix alone.
        let stored = compress(&vec![0u8; 1 << 16]).unwrap();
        let err = decompress(&stored, 10, 0).unwrap_err();
        match &err {
            Error::EntryDecode { reason, .. } => {
                assert!(reason.contains("length prefix"), "reason: {reason}");
            }
            other => panic!("expected EntryDecode, got {other:?}"),
        }
    }

    #[test]
    fn stream_inflating_past_declared_length_is_cut_off() {
        // Prefix and descriptor agree, but the stream holds more bytes;
        // inflation must stop right past the declared length.
        let mut stored = compress(b"abcdefgh").unwrap();
        stored[..4].copy_from_slice(&4u32.to_le_bytes());
        let err = decompress(&stored, 4, 0).unwrap_err();
        assert!(err.to_string().contains("inflated to 5 bytes"));
    }

    #[test]
    fn decompress_rejects_garbage_stream() {
        let mut stored = 4u32.to_le_bytes().to_vec();
        stored.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00]);
        assert!(decompress(&stored, 4, 0).is_err());
    }
}
