//! Advisory metadata for well-known EDF data files.
//!
//! The game ships twelve numbered data files (`dat001.edf` through
//! `dat012.edf`); the number determines both what the file holds and
//! which transformation protects it. The archive model itself is
//! kind-agnostic; this module exists so editor frontends can label
//! entries and pick sensible default flags without hard-coding the
//! numbering.

use crate::codec::{FLAG_INTERLEAVED, FLAG_SWAPPED};

/// What a numbered data file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Game credits text, stored plain.
    Credits,
    /// Client checksum data, stored plain.
    Checksum,
    /// Chat curse filter word list, interleaved but not swapped.
    CurseFilter,
    /// Jukebox track names.
    Jukebox,
    /// First game text table.
    Game1,
    /// Second game text table.
    Game2,
}

/// The language a numbered data file is localized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// English (files 1-6).
    English,
    /// Dutch (files 7-8).
    Dutch,
    /// Swedish (files 9-10).
    Swedish,
    /// Portuguese (files 11-12).
    Portuguese,
}

impl EntryKind {
    /// Maps a 1-based data file number to its kind.
    ///
    /// Returns `None` for numbers outside the known range `1..=12`.
    pub fn from_data_file_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Credits),
            2 => Some(Self::Checksum),
            3 => Some(Self::CurseFilter),
            4 => Some(Self::Jukebox),
            5 | 7 | 9 | 11 => Some(Self::Game1),
            6 | 8 | 10 | 12 => Some(Self::Game2),
            _ => None,
        }
    }

    /// The flag byte new entries of this kind conventionally get.
    ///
    /// Credits and checksum data are stored plain; the curse filter is
    /// interleaved but skips the swap pass; everything else gets the full
    /// transformation.
    pub fn default_flags(self) -> u8 {
        match self {
            Self::Credits | Self::Checksum => 0,
            Self::CurseFilter => FLAG_INTERLEAVED,
            _ => FLAG_INTERLEAVED | FLAG_SWAPPED,
        }
    }
}

impl Language {
    /// Maps a 1-based data file number to its language.
    ///
    /// Returns `None` for numbers outside the known range `1..=12`.
    pub fn from_data_file_id(id: u32) -> Option<Self> {
        match id {
            1..=6 => Some(Self::English),
            7 | 8 => Some(Self::Dutch),
            9 | 10 => Some(Self::Swedish),
            11 | 12 => Some(Self::Portuguese),
            _ => None,
        }
    }
}
