//! Shared helpers for edfarc integration tests.

#![allow(dead_code)]

use std::io::Cursor;

use edfarc::Archive;
use edfarc::format::{DESCRIPTOR_SIZE, HEADER_SIZE};

/// Builds archive bytes from `(payload, flags)` pairs via the public API.
pub fn build_archive(entries: &[(&[u8], u8)]) -> Vec<u8> {
    let mut archive = Archive::new();
    for (payload, flags) in entries {
        let id = archive.append(payload.to_vec());
        archive.set_flags(id, *flags).expect("known flags");
    }
    let mut out = Vec::new();
    archive.save(&mut out).expect("saving a fresh archive");
    out
}

/// Loads an archive over an in-memory cursor.
pub fn load(bytes: &[u8]) -> edfarc::Result<Archive<Cursor<Vec<u8>>>> {
    Archive::load(Cursor::new(bytes.to_vec()))
}

/// Absolute byte offset of the data region for a `count`-entry archive.
pub fn data_start(count: usize) -> usize {
    HEADER_SIZE + count * DESCRIPTOR_SIZE
}

/// Extracts each entry's stored run from serialized archive bytes, using
/// the live index.
pub fn stored_runs(bytes: &[u8]) -> Vec<Vec<u8>> {
    let archive = load(bytes).expect("valid archive");
    let count = archive.len();
    let start = data_start(count);
    archive
        .entries()
        .map(|info| {
            let desc_at = HEADER_SIZE + info.id * DESCRIPTOR_SIZE;
            let offset =
                u32::from_le_bytes(bytes[desc_at..desc_at + 4].try_into().unwrap()) as usize;
            let stored_len = info.stored_len.expect("saved entry") as usize;
            bytes[start + offset..start + offset + stored_len].to_vec()
        })
        .collect()
}
