//! Structural validation of loaded archives.
//!
//! The validator cross-checks the index against the data region and
//! reports every problem it finds as an [`Issue`] instead of stopping at
//! the first one, so an editor can show a damaged archive's full state at
//! once. It never mutates the archive; the archive model decides what to
//! refuse based on the report (fatal issues block `save`).

use crate::codec::{self, FLAG_COMPRESSED};

/// How serious a validator finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum IssueKind {
    /// A descriptor's byte range extends past the end of the data region.
    ///
    /// Fatal: the entry's stored run cannot be copied on save.
    OutOfBoundsDescriptor,
    /// Two descriptors' byte ranges overlap.
    ///
    /// Fatal: the format does not allow shared runs, so overlap means the
    /// index is corrupt.
    OverlappingDescriptors,
    /// An entry carries flag bits this build does not understand.
    UnknownFlags,
    /// A compressed run is too short to hold its length prefix.
    TruncatedCompressedRun,
    /// An uncompressed run's stored length differs from its declared
    /// length, which the length-preserving transformation forbids.
    StoredLengthMismatch,
}

impl IssueKind {
    /// Returns `true` if saving an archive with this issue unresolved
    /// would produce a worse-corrupted file.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::OutOfBoundsDescriptor | Self::OverlappingDescriptors
        )
    }
}

/// One validator finding.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Ordinal of the affected entry, when the issue is entry-specific.
    pub entry: Option<usize>,
    /// What went wrong.
    pub kind: IssueKind,
    /// Human-readable detail with offsets and sizes.
    pub detail: String,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.entry {
            Some(id) => write!(f, "entry {}: {:?}: {}", id, self.kind, self.detail),
            None => write!(f, "{:?}: {}", self.kind, self.detail),
        }
    }
}

/// Per-entry view the archive model hands to [`audit`].
#[derive(Debug, Clone)]
pub(crate) struct EntrySnapshot {
    /// Flags the entry will be written with.
    pub flags: u8,
    /// Declared decoded length.
    pub declared_len: u32,
    /// Baseline stored-run metadata, `None` for never-saved entries.
    pub baseline: Option<BaselineSnapshot>,
    /// Whether save would re-encode this entry rather than copy its
    /// baseline run verbatim.
    pub will_reencode: bool,
}

/// Baseline stored-run metadata for [`EntrySnapshot`].
#[derive(Debug, Clone)]
pub(crate) struct BaselineSnapshot {
    /// Flags the stored run was encoded with.
    pub flags: u8,
    /// Stored run length in bytes.
    pub stored_len: u32,
    /// Data-region-relative offset, `None` when the run is held in memory
    /// from a previous save.
    pub source_offset: Option<u32>,
}

/// Audits entry snapshots against the data region size.
///
/// Bounds and overlap checks only apply to runs that save would copy
/// verbatim from the source; a dirty replacement never reads its broken
/// baseline, which gives callers a repair path for damaged entries.
pub(crate) fn audit(entries: &[EntrySnapshot], data_region_len: u64) -> Vec<Issue> {
    let mut issues = Vec::new();

    // (offset, stored_len, entry) for every run still read from the source.
    let mut source_runs: Vec<(u32, u32, usize)> = Vec::new();

    for (id, entry) in entries.iter().enumerate() {
        let unknown = codec::unknown_flags(entry.flags);
        if unknown != 0 {
            issues.push(Issue {
                entry: Some(id),
                kind: IssueKind::UnknownFlags,
                detail: format!("flag bits {unknown:#04x} are not understood by this build"),
            });
        }

        let Some(baseline) = &entry.baseline else {
            continue;
        };

        let unknown = codec::unknown_flags(baseline.flags);
        if unknown != 0 && baseline.flags != entry.flags {
            issues.push(Issue {
                entry: Some(id),
                kind: IssueKind::UnknownFlags,
                detail: format!("stored run carries unknown flag bits {unknown:#04x}"),
            });
        }

        if baseline.flags & FLAG_COMPRESSED != 0 {
            if baseline.stored_len < 4 {
                issues.push(Issue {
                    entry: Some(id),
                    kind: IssueKind::TruncatedCompressedRun,
                    detail: format!(
                        "compressed run of {} bytes cannot hold its 4-byte length prefix",
                        baseline.stored_len
                    ),
                });
            }
        } else if !entry.will_reencode && baseline.stored_len != entry.declared_len {
            issues.push(Issue {
                entry: Some(id),
                kind: IssueKind::StoredLengthMismatch,
                detail: format!(
                    "uncompressed run stores {} bytes but declares {}",
                    baseline.stored_len, entry.declared_len
                ),
            });
        }

        if entry.will_reencode {
            continue;
        }
        if let Some(offset) = baseline.source_offset {
            let end = u64::from(offset) + u64::from(baseline.stored_len);
            if end > data_region_len {
                issues.push(Issue {
                    entry: Some(id),
                    kind: IssueKind::OutOfBoundsDescriptor,
                    detail: format!(
                        "run {offset:#x}..{end:#x} exceeds the {data_region_len}-byte data region"
                    ),
                });
            } else if baseline.stored_len > 0 {
                source_runs.push((offset, baseline.stored_len, id));
            }
        }
    }

    // Overlap detection over in-bounds, non-empty source runs. The scan
    // carries the furthest end seen so far, so every run inside one
    // containing run is reported, not just the first.
    source_runs.sort_unstable();
    let mut max_end = 0u64;
    let mut max_holder = 0usize;
    for &(offset, len, id) in &source_runs {
        let start = u64::from(offset);
        let end = start + u64::from(len);
        if start < max_end {
            issues.push(Issue {
                entry: Some(id),
                kind: IssueKind::OverlappingDescriptors,
                detail: format!(
                    "run {start:#x}..{end:#x} overlaps entry {max_holder}'s run ending at {max_end:#x}"
                ),
            });
        }
        if end > max_end {
            max_end = end;
            max_holder = id;
        }
    }

    issues
}
