//! The mutable in-memory archive document.
//!
//! An [`Archive`] owns its reader and an ordered sequence of entries.
//! Entry payloads are materialized lazily: loading parses only the header
//! and index, and an entry's stored run is read and decoded the first
//! time [`get`][Archive::get] touches it. Edits mark entries dirty in
//! memory; nothing is written until [`save`][Archive::save].
//!
//! Saving re-encodes only entries that are dirty or whose flags changed.
//! Every other stored run is copied verbatim from its original bytes, so
//! an edit to one entry never perturbs the stored bytes of the others.
//!
//! Entry ordinals are 0-based positions in the sequence, derived from the
//! sequence itself and never stored on the entry: removing entry 2 of 5
//! renumbers the former entries 3 and 4 to 2 and 3.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, trace, warn};

use crate::codec::{self, DEFAULT_FLAGS};
use crate::cursor::{ByteReader, ByteWriter};
use crate::format::{DESCRIPTOR_SIZE, Descriptor, HEADER_SIZE, Header, VERSION};
use crate::validate::{BaselineSnapshot, EntrySnapshot, Issue, audit};
use crate::{Error, Result};

/// Payload state of one entry.
///
/// `Unloaded → Loaded` on first read, `→ Dirty` on write (`Unloaded →
/// Dirty` is also valid: overwriting without ever reading). A successful
/// save re-baselines `Dirty` back to `Loaded`.
#[derive(Debug)]
enum PayloadState {
    /// Not yet decoded; the baseline stored run holds the bytes.
    Unloaded,
    /// Decoded and cached, unchanged since load or last save.
    Loaded(Vec<u8>),
    /// Replaced in memory since the last save.
    Dirty(Vec<u8>),
}

/// Where a baseline stored run currently lives.
#[derive(Debug)]
enum StoredRun {
    /// Still in the source reader, at this data-region-relative offset.
    InSource { offset: u32 },
    /// Held in memory since the last save re-encoded it.
    InMemory(Vec<u8>),
}

/// The stored run an entry was last read from or written as.
#[derive(Debug)]
struct Baseline {
    run: StoredRun,
    stored_len: u32,
    crc32: u32,
    /// Flags the run was encoded with (the entry's target flags may
    /// differ after `set_flags`).
    flags: u8,
}

#[derive(Debug)]
struct Entry {
    declared_len: usize,
    flags: u8,
    baseline: Option<Baseline>,
    state: PayloadState,
}

impl Entry {
    fn fresh(payload: Vec<u8>, flags: u8) -> Self {
        Self {
            declared_len: payload.len(),
            flags,
            baseline: None,
            state: PayloadState::Dirty(payload),
        }
    }

    /// Whether save must run the codec instead of copying the baseline.
    fn needs_encode(&self) -> bool {
        match &self.baseline {
            None => true,
            Some(baseline) => {
                matches!(self.state, PayloadState::Dirty(_)) || baseline.flags != self.flags
            }
        }
    }
}

/// Read-only summary of one entry, as produced by [`Archive::entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    /// The entry's ordinal (its current position).
    pub id: usize,
    /// Decoded payload length in bytes.
    pub declared_len: usize,
    /// Stored run length in bytes; `None` for entries never yet saved.
    pub stored_len: Option<u32>,
    /// The entry's current flag byte.
    pub flags: u8,
}

/// Per-entry output produced while rendering a save.
struct RenderedEntry {
    stored: Vec<u8>,
    crc32: u32,
    flags: u8,
    reencoded: bool,
}

/// A mutable EDF archive document.
///
/// # Example
///
/// ```rust,no_run
/// use edfarc::{Archive, Result};
///
/// fn touch_up(path: &str) -> Result<()> {
///     let mut archive = Archive::open_path(path)?;
///     let first = archive.get(0)?.to_vec();
///     archive.append(first);
///     archive.remove(1)?;
///     archive.save_path(path)?;
///     Ok(())
/// }
/// ```
///
/// The archive is a single mutable document with no internal locking;
/// callers sharing one across threads must serialize access themselves.
#[derive(Debug)]
pub struct Archive<R> {
    source: R,
    version: u16,
    /// Absolute offset of the data region in the source.
    data_start: u64,
    /// Bytes available in the source's data region.
    data_region_len: u64,
    entries: Vec<Entry>,
    load_issues: Vec<Issue>,
}

impl Archive<io::Empty> {
    /// Creates a new empty archive with a default header.
    pub fn new() -> Self {
        Self {
            source: io::empty(),
            version: VERSION,
            data_start: 0,
            data_region_len: 0,
            entries: Vec::new(),
            load_issues: Vec::new(),
        }
    }
}

impl Default for Archive<io::Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl Archive<BufReader<File>> {
    /// Opens an archive file from a path.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::load(BufReader::new(file))
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Loads an archive from a reader.
    ///
    /// The header and index are parsed eagerly; entry payloads stay
    /// unloaded until first read. Descriptor range problems (runs out of
    /// bounds, overlaps) do not fail the load; they are recorded as
    /// validator issues so a damaged archive can still be inspected.
    /// Header and index parse failures do abort it, and a partially
    /// loaded archive is never returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMagic`] / [`Error::UnsupportedVersion`] for
    ///   foreign or too-new files
    /// - [`Error::CorruptArchive`] for a truncated header or index
    /// - [`Error::Io`] for underlying read failures
    pub fn load(mut source: R) -> Result<Self> {
        let file_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        let mut prefix = vec![0u8; HEADER_SIZE.min(file_len as usize)];
        source.read_exact(&mut prefix)?;
        let header = Header::parse(&mut ByteReader::new(&prefix)).map_err(|e| match e {
            Error::TruncatedInput { .. } => Error::CorruptArchive {
                reason: format!("truncated header: {e}"),
            },
            other => other,
        })?;

        let count = usize::from(header.entry_count);
        let index_len = count * DESCRIPTOR_SIZE;
        let mut index = vec![0u8; index_len];
        source.read_exact(&mut index).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::CorruptArchive {
                    reason: format!(
                        "index truncated: {count} descriptors need {index_len} bytes"
                    ),
                }
            } else {
                Error::Io(e)
            }
        })?;

        let mut reader = ByteReader::new(&index);
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let desc = Descriptor::parse(&mut reader)?;
            entries.push(Entry {
                declared_len: desc.declared_len as usize,
                flags: desc.flags,
                baseline: Some(Baseline {
                    run: StoredRun::InSource {
                        offset: desc.offset,
                    },
                    stored_len: desc.stored_len,
                    crc32: desc.crc32,
                    flags: desc.flags,
                }),
                state: PayloadState::Unloaded,
            });
        }

        let data_start = (HEADER_SIZE + index_len) as u64;
        let data_region_len = file_len - data_start;

        let mut archive = Self {
            source,
            version: header.version,
            data_start,
            data_region_len,
            entries,
            load_issues: Vec::new(),
        };
        archive.load_issues = archive.validate();

        debug!(
            "loaded archive: version {}, {} entries, {} byte data region",
            archive.version,
            archive.entries.len(),
            data_region_len
        );
        for issue in &archive.load_issues {
            warn!("load issue: {issue}");
        }

        Ok(archive)
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The archive's format version.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Issues the validator recorded while loading.
    pub fn load_issues(&self) -> &[Issue] {
        &self.load_issues
    }

    /// Iterates over read-only entry summaries in ordinal order.
    pub fn entries(&self) -> impl Iterator<Item = EntryInfo> + '_ {
        self.entries.iter().enumerate().map(|(id, e)| EntryInfo {
            id,
            declared_len: e.declared_len,
            stored_len: e.baseline.as_ref().map(|b| b.stored_len),
            flags: e.flags,
        })
    }

    /// Returns the decoded payload of entry `id`, materializing it on
    /// first access and caching the result.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if `id` is out of range
    /// - [`Error::EntryDecode`] if the stored run cannot be decoded
    pub fn get(&mut self, id: usize) -> Result<&[u8]> {
        self.check_bounds(id)?;
        if matches!(self.entries[id].state, PayloadState::Unloaded) {
            let decoded = self.materialize(id)?;
            self.entries[id].state = PayloadState::Loaded(decoded);
        }
        match &self.entries[id].state {
            PayloadState::Loaded(bytes) | PayloadState::Dirty(bytes) => Ok(bytes),
            PayloadState::Unloaded => unreachable!("entry was just materialized"),
        }
    }

    /// Replaces entry `id`'s payload, marking it dirty. No I/O occurs
    /// until [`save`][Self::save].
    pub fn replace(&mut self, id: usize, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.check_bounds(id)?;
        let payload = payload.into();
        let entry = &mut self.entries[id];
        entry.declared_len = payload.len();
        entry.state = PayloadState::Dirty(payload);
        Ok(())
    }

    /// Inserts a new entry at position `id` with the default flags,
    /// shifting ordinals of all later entries up by one.
    ///
    /// `id` may equal [`len`][Self::len], which appends.
    pub fn insert(&mut self, id: usize, payload: impl Into<Vec<u8>>) -> Result<()> {
        if id > self.entries.len() {
            return Err(Error::EntryNotFound {
                entry_index: id,
                len: self.entries.len(),
            });
        }
        self.entries
            .insert(id, Entry::fresh(payload.into(), DEFAULT_FLAGS));
        Ok(())
    }

    /// Appends a new entry at the end with the default flags and returns
    /// its ordinal.
    pub fn append(&mut self, payload: impl Into<Vec<u8>>) -> usize {
        self.entries
            .push(Entry::fresh(payload.into(), DEFAULT_FLAGS));
        self.entries.len() - 1
    }

    /// Removes entry `id`, shifting ordinals of all later entries down
    /// by one.
    pub fn remove(&mut self, id: usize) -> Result<()> {
        self.check_bounds(id)?;
        self.entries.remove(id);
        Ok(())
    }

    /// Moves entry `from` to position `to`, shifting the entries between
    /// them by one.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_bounds(from)?;
        self.check_bounds(to)?;
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        Ok(())
    }

    /// Changes entry `id`'s storage flags without touching its payload.
    ///
    /// A flag change forces the entry to be re-encoded on the next save.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if `id` is out of range
    /// - [`Error::UnknownFlags`] if `flags` contains bits this build
    ///   does not understand
    pub fn set_flags(&mut self, id: usize, flags: u8) -> Result<()> {
        self.check_bounds(id)?;
        if codec::unknown_flags(flags) != 0 {
            return Err(Error::UnknownFlags {
                entry_index: id,
                flags,
            });
        }
        self.entries[id].flags = flags;
        Ok(())
    }

    /// Audits the archive structure, returning every issue found.
    ///
    /// Never mutates the archive and never fails; see
    /// [`IssueKind::is_fatal`][crate::validate::IssueKind::is_fatal] for
    /// which issues block saving.
    pub fn validate(&self) -> Vec<Issue> {
        let snapshots: Vec<EntrySnapshot> = self
            .entries
            .iter()
            .map(|e| EntrySnapshot {
                flags: e.flags,
                declared_len: e.declared_len.min(u32::MAX as usize) as u32,
                baseline: e.baseline.as_ref().map(|b| BaselineSnapshot {
                    flags: b.flags,
                    stored_len: b.stored_len,
                    source_offset: match b.run {
                        StoredRun::InSource { offset } => Some(offset),
                        StoredRun::InMemory(_) => None,
                    },
                }),
                will_reencode: e.needs_encode(),
            })
            .collect();
        audit(&snapshots, self.data_region_len)
    }

    /// Serializes the archive to `sink`.
    ///
    /// Dirty and flag-changed entries are re-encoded; everything else is
    /// copied verbatim from its baseline stored run. The whole output is
    /// staged in memory first, so a failed save writes nothing to `sink`.
    /// On success every dirty entry is re-baselined to its freshly
    /// encoded run.
    ///
    /// # Errors
    ///
    /// - [`Error::Save`] if a fatal validator issue is unresolved, an
    ///   entry fails to encode, or the archive outgrows the format's
    ///   field widths
    /// - [`Error::Io`] if writing to `sink` fails
    pub fn save<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        let (output, rendered) = self.render()?;
        sink.write_all(&output)?;
        sink.flush()?;
        self.apply_baselines(rendered);
        debug!(
            "saved archive: {} entries, {} bytes",
            self.entries.len(),
            output.len()
        );
        Ok(())
    }

    /// Serializes the archive to a file, atomically.
    ///
    /// The output is written to a sibling temporary file which replaces
    /// `path` only after every byte is flushed; a failed save leaves the
    /// original file untouched.
    pub fn save_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (output, rendered) = self.render()?;

        let tmp = tmp_sibling(path);
        let result = (|| -> Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&output)?;
            file.sync_all()?;
            std::fs::rename(&tmp, path)?;
            Ok(())
        })();
        if result.is_err() {
            // Best effort; the interesting error is the write failure.
            let _ = std::fs::remove_file(&tmp);
        }
        result?;

        self.apply_baselines(rendered);
        debug!(
            "saved archive to {}: {} entries, {} bytes",
            path.display(),
            self.entries.len(),
            output.len()
        );
        Ok(())
    }

    fn check_bounds(&self, id: usize) -> Result<()> {
        if id >= self.entries.len() {
            return Err(Error::EntryNotFound {
                entry_index: id,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    /// Decodes entry `id`'s baseline stored run.
    fn materialize(&mut self, id: usize) -> Result<Vec<u8>> {
        let entry = &self.entries[id];
        let Some(baseline) = &entry.baseline else {
            return Err(Error::EntryDecode {
                entry_index: id,
                reason: "entry has no stored run to decode".into(),
            });
        };
        let desc = Descriptor {
            offset: 0,
            stored_len: baseline.stored_len,
            declared_len: entry.declared_len.min(u32::MAX as usize) as u32,
            crc32: baseline.crc32,
            flags: baseline.flags,
        };
        let stored = self.read_baseline_run(id)?;
        trace!("materializing entry {id}: {} stored bytes", stored.len());
        codec::decode(&stored, &desc, id)
    }

    /// Fetches entry `id`'s baseline stored bytes, from the source reader
    /// or from memory.
    fn read_baseline_run(&mut self, id: usize) -> Result<Vec<u8>> {
        let Some(baseline) = &self.entries[id].baseline else {
            return Err(Error::EntryDecode {
                entry_index: id,
                reason: "entry has no stored run".into(),
            });
        };
        let (offset, len) = match &baseline.run {
            StoredRun::InMemory(bytes) => return Ok(bytes.clone()),
            StoredRun::InSource { offset } => (*offset, baseline.stored_len),
        };

        let end = u64::from(offset) + u64::from(len);
        if end > self.data_region_len {
            return Err(Error::EntryDecode {
                entry_index: id,
                reason: format!(
                    "stored run {offset:#x}..{end:#x} exceeds the {}-byte data region",
                    self.data_region_len
                ),
            });
        }

        self.source
            .seek(SeekFrom::Start(self.data_start + u64::from(offset)))?;
        let mut stored = vec![0u8; len as usize];
        self.source.read_exact(&mut stored).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::EntryDecode {
                    entry_index: id,
                    reason: "stored run truncated in source".into(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Ok(stored)
    }

    /// Produces the serialized archive and the per-entry stored runs the
    /// save will re-baseline from.
    fn render(&mut self) -> Result<(Vec<u8>, Vec<RenderedEntry>)> {
        let fatal: Vec<Issue> = self
            .validate()
            .into_iter()
            .filter(|i| i.kind.is_fatal())
            .collect();
        if let Some(first) = fatal.first() {
            return Err(Error::Save {
                reason: format!(
                    "{} unresolved fatal validator issue(s), first: {first}",
                    fatal.len()
                ),
            });
        }

        let count = self.entries.len();
        if count > usize::from(u16::MAX) {
            return Err(Error::Save {
                reason: format!("{count} entries exceed the format's u16 entry count"),
            });
        }

        // Entries whose flags changed but which were never read must be
        // decoded (with their old flags) before they can be re-encoded.
        for id in 0..count {
            if self.entries[id].needs_encode()
                && matches!(self.entries[id].state, PayloadState::Unloaded)
            {
                let decoded = self.materialize(id).map_err(|e| Error::Save {
                    reason: format!("entry {id} could not be re-encoded: {e}"),
                })?;
                self.entries[id].state = PayloadState::Loaded(decoded);
            }
        }

        let mut rendered = Vec::with_capacity(count);
        for id in 0..count {
            let entry = &self.entries[id];
            if entry.declared_len > u32::MAX as usize {
                return Err(Error::Save {
                    reason: format!(
                        "entry {id} payload of {} bytes exceeds the format's u32 length",
                        entry.declared_len
                    ),
                });
            }

            let item = if entry.needs_encode() {
                let decoded = match &entry.state {
                    PayloadState::Loaded(bytes) | PayloadState::Dirty(bytes) => bytes,
                    PayloadState::Unloaded => {
                        unreachable!("unloaded entries were materialized above")
                    }
                };
                let (stored, flags) =
                    codec::encode(decoded, entry.flags).map_err(|e| Error::Save {
                        reason: format!("entry {id} failed to encode: {e}"),
                    })?;
                RenderedEntry {
                    crc32: codec::payload_crc(decoded),
                    flags,
                    stored,
                    reencoded: true,
                }
            } else {
                // needs_encode() is false, so a baseline exists.
                let (crc32, flags) = match &self.entries[id].baseline {
                    Some(b) => (b.crc32, b.flags),
                    None => (0, 0),
                };
                let stored = self.read_baseline_run(id).map_err(|e| Error::Save {
                    reason: format!("entry {id} stored run unreadable: {e}"),
                })?;
                RenderedEntry {
                    crc32,
                    flags,
                    stored,
                    reencoded: false,
                }
            };
            rendered.push(item);
        }

        // Offsets depend on cumulative prior sizes, so the index is
        // written only after every stored run is final.
        let mut writer = ByteWriter::new();
        Header {
            version: self.version,
            entry_count: count as u16,
        }
        .write(&mut writer)?;

        let mut offset: u64 = 0;
        for (id, item) in rendered.iter().enumerate() {
            if item.stored.len() > u32::MAX as usize || offset > u64::from(u32::MAX) {
                return Err(Error::Save {
                    reason: format!("entry {id} overflows the format's u32 offset field"),
                });
            }
            Descriptor {
                offset: offset as u32,
                stored_len: item.stored.len() as u32,
                declared_len: self.entries[id].declared_len as u32,
                crc32: item.crc32,
                flags: item.flags,
            }
            .write(&mut writer)?;
            offset += item.stored.len() as u64;
        }

        for item in &rendered {
            writer.write_bytes(&item.stored)?;
        }

        Ok((writer.into_inner(), rendered))
    }

    /// Re-baselines entries after a successful save.
    fn apply_baselines(&mut self, rendered: Vec<RenderedEntry>) {
        for (entry, item) in self.entries.iter_mut().zip(rendered) {
            if !item.reencoded {
                continue;
            }
            entry.flags = item.flags;
            entry.baseline = Some(Baseline {
                stored_len: item.stored.len() as u32,
                crc32: item.crc32,
                flags: item.flags,
                run: StoredRun::InMemory(item.stored),
            });
            let state = std::mem::replace(&mut entry.state, PayloadState::Unloaded);
            entry.state = match state {
                PayloadState::Dirty(bytes) => PayloadState::Loaded(bytes),
                other => other,
            };
        }
    }
}

/// Builds the sibling temporary path `save_path` stages output in.
fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_archive_is_empty() {
        let archive = Archive::new();
        assert!(archive.is_empty());
        assert_eq!(archive.len(), 0);
        assert_eq!(archive.version(), VERSION);
        assert!(archive.load_issues().is_empty());
    }

    #[test]
    fn tmp_sibling_keeps_directory() {
        let tmp = tmp_sibling(Path::new("/data/archive.edf"));
        assert_eq!(tmp, Path::new("/data/archive.edf.tmp"));
    }

    #[test]
    fn fresh_entries_need_encoding() {
        let entry = Entry::fresh(vec![1, 2, 3], DEFAULT_FLAGS);
        assert!(entry.needs_encode());
        assert_eq!(entry.declared_len, 3);
    }
}
