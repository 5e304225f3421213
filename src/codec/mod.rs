//! Per-entry codec: the bidirectional mapping between an entry's decoded
//! payload and its on-disk stored run.
//!
//! Encoding applies, in order: the swap-multiples substitution (flag
//! [`FLAG_SWAPPED`]), the interleave permutation ([`FLAG_INTERLEAVED`]),
//! and finally deflate compression ([`FLAG_COMPRESSED`]). Compression is
//! kept only when it actually shrinks the run; otherwise the flag is
//! cleared and the transformed bytes are stored raw. Decoding is the exact
//! reverse, finishing with a CRC-32 check of the decoded payload against
//! the descriptor.
//!
//! Both directions are deterministic: the same payload and flags always
//! produce the same stored bytes, which is what lets the archive model
//! guarantee minimal-diff saves.

pub mod deflate;
pub mod transform;

use crate::format::Descriptor;
use crate::{Error, Result};

/// Stored run is deflate-compressed with a length prefix.
pub const FLAG_COMPRESSED: u8 = 0x01;
/// Payload bytes are permuted with the interleave weave.
pub const FLAG_INTERLEAVED: u8 = 0x02;
/// Runs of byte values divisible by 7 are reversed.
pub const FLAG_SWAPPED: u8 = 0x04;

/// All flag bits this build understands.
pub const KNOWN_FLAGS: u8 = FLAG_COMPRESSED | FLAG_INTERLEAVED | FLAG_SWAPPED;

/// The flag byte applied to entries created without explicit flags:
/// interleaved and swapped, the standard encoding for game data entries.
pub const DEFAULT_FLAGS: u8 = FLAG_INTERLEAVED | FLAG_SWAPPED;

/// Returns the flag bits in `flags` that this build does not understand.
pub fn unknown_flags(flags: u8) -> u8 {
    flags & !KNOWN_FLAGS
}

/// Computes the CRC-32 checksum of a decoded payload.
pub fn payload_crc(decoded: &[u8]) -> u32 {
    crc32fast::hash(decoded)
}

/// Encodes a decoded payload into its stored representation.
///
/// Returns the stored bytes together with the effective flag byte, which
/// equals `flags` except that [`FLAG_COMPRESSED`] is cleared when
/// compression would not shrink the run.
pub fn encode(decoded: &[u8], flags: u8) -> Result<(Vec<u8>, u8)> {
    let mut transformed = decoded.to_vec();
    if flags & FLAG_SWAPPED != 0 {
        transform::swap_multiples(&mut transformed, transform::SWAP_MULTIPLE);
    }
    if flags & FLAG_INTERLEAVED != 0 {
        transform::interleave(&mut transformed);
    }

    if flags & FLAG_COMPRESSED != 0 {
        let compressed = deflate::compress(&transformed)?;
        if compressed.len() < transformed.len() {
            return Ok((compressed, flags));
        }
        // Incompressible: store the transformed bytes raw instead of
        // inflating the archive.
        return Ok((transformed, flags & !FLAG_COMPRESSED));
    }

    Ok((transformed, flags))
}

/// Decodes a stored run back into the entry payload described by `desc`.
///
/// `entry_index` is carried into error context. Fails with
/// [`Error::EntryDecode`] when the run's implied output length disagrees
/// with the declared length, the deflate stream is malformed, unknown flag
/// bits are set, or the decoded checksum does not match the descriptor.
pub fn decode(stored: &[u8], desc: &Descriptor, entry_index: usize) -> Result<Vec<u8>> {
    let unknown = unknown_flags(desc.flags);
    if unknown != 0 {
        return Err(Error::EntryDecode {
            entry_index,
            reason: format!("unknown flag bits {unknown:#04x}"),
        });
    }

    let mut decoded = if desc.flags & FLAG_COMPRESSED != 0 {
        deflate::decompress(stored, desc.declared_len, entry_index)?
    } else {
        stored.to_vec()
    };

    // The transformations are length-preserving, so the decoded length is
    // fixed before they run.
    if decoded.len() != desc.declared_len as usize {
        return Err(Error::EntryDecode {
            entry_index,
            reason: format!(
                "stored run decodes to {} bytes but the descriptor declares {}",
                decoded.len(),
                desc.declared_len
            ),
        });
    }

    if desc.flags & FLAG_INTERLEAVED != 0 {
        transform::deinterleave(&mut decoded);
    }
    if desc.flags & FLAG_SWAPPED != 0 {
        transform::swap_multiples(&mut decoded, transform::SWAP_MULTIPLE);
    }

    let actual = payload_crc(&decoded);
    if actual != desc.crc32 {
        return Err(Error::EntryDecode {
            entry_index,
            reason: format!(
                "checksum mismatch: expected {:#010x}, got {actual:#010x}",
                desc.crc32
            ),
        });
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor_for(decoded: &[u8], stored_len: usize, flags: u8) -> Descriptor {
        Descriptor {
            offset: 0,
            stored_len: stored_len as u32,
            declared_len: decoded.len() as u32,
            crc32: payload_crc(decoded),
            flags,
        }
    }

    #[test]
    fn encode_decode_all_flag_combinations() {
        let payload = b"The quick brown fox jumps over the lazy dog. \x00\x07\x0e\x15";
        for flags in 0..=KNOWN_FLAGS {
            let (stored, effective) = encode(payload, flags).unwrap();
            let desc = descriptor_for(payload, stored.len(), effective);
            let decoded = decode(&stored, &desc, 0).unwrap();
            assert_eq!(decoded, payload, "flags {flags:#04x}");
        }
    }

    #[test]
    fn encode_is_deterministic() {
        let payload: Vec<u8> = (0..200u8).cycle().take(1000).collect();
        let (a, fa) = encode(&payload, DEFAULT_FLAGS | FLAG_COMPRESSED).unwrap();
        let (b, fb) = encode(&payload, DEFAULT_FLAGS | FLAG_COMPRESSED).unwrap();
        assert_eq!(a, b);
        assert_eq!(fa, fb);
    }

    #[test]
    fn incompressible_payload_clears_compression_flag() {
        // A short high-entropy payload only grows under deflate.
        let payload = [0x7f, 0x03, 0xe1, 0x92, 0x54, 0xab];
        let (stored, effective) = encode(&payload, FLAG_COMPRESSED).unwrap();
        assert_eq!(effective, 0);
        assert_eq!(stored, payload);
    }

    #[test]
    fn compressible_payload_keeps_flag_and_shrinks() {
        let payload = vec![b'a'; 4096];
        let (stored, effective) = encode(&payload, FLAG_COMPRESSED).unwrap();
        assert_eq!(effective, FLAG_COMPRESSED);
        assert!(stored.len() < payload.len());
    }

    #[test]
    fn decode_rejects_declared_length_mismatch() {
        let payload = b"twelve bytes";
        let (stored, effective) = encode(payload, DEFAULT_FLAGS).unwrap();
        let mut desc = descriptor_for(payload, stored.len(), effective);
        desc.declared_len += 1;
        let err = decode(&stored, &desc, 4).unwrap_err();
        match err {
            Error::EntryDecode { entry_index, .. } => assert_eq!(entry_index, 4),
            other => panic!("expected EntryDecode, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_oversized_compressed_run_on_the_prefix() {
        // A compressed run inflating to megabytes for an entry declaring
        // 10 bytes must fail the prefix check, not inflate first.
        let payload = vec![0u8; 1 << 22];
        let (stored, effective) = encode(&payload, FLAG_COMPRESSED).unwrap();
        assert_ne!(effective & FLAG_COMPRESSED, 0);
        let desc = Descriptor {
            offset: 0,
            stored_len: stored.len() as u32,
            declared_len: 10,
            crc32: payload_crc(&payload),
            flags: effective,
        };
        let err = decode(&stored, &desc, 0).unwrap_err();
        assert!(err.to_string().contains("length prefix"));
    }

    #[test]
    fn decode_rejects_checksum_mismatch() {
        let payload = b"payload under test";
        let (stored, effective) = encode(payload, DEFAULT_FLAGS).unwrap();
        let mut desc = descriptor_for(payload, stored.len(), effective);
        desc.crc32 ^= 0xffff_ffff;
        let err = decode(&stored, &desc, 0).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn decode_rejects_unknown_flags() {
        let desc = Descriptor {
            offset: 0,
            stored_len: 0,
            declared_len: 0,
            crc32: payload_crc(b""),
            flags: 0x80,
        };
        let err = decode(&[], &desc, 2).unwrap_err();
        assert!(err.to_string().contains("unknown flag bits"));
    }

    #[test]
    fn empty_payload_roundtrips() {
        let (stored, effective) = encode(b"", DEFAULT_FLAGS).unwrap();
        assert!(stored.is_empty());
        let desc = descriptor_for(b"", 0, effective);
        assert_eq!(decode(&stored, &desc, 0).unwrap(), b"");
    }
}
