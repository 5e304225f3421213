//! # edfarc
//!
//! A library for reading, editing, and writing EDF game data archives.
//!
//! An EDF archive is a compact binary container holding an ordered
//! sequence of numbered resource entries. Each entry's payload is stored
//! through a reversible byte transformation (an interleave permutation
//! and a swap-multiples substitution, as the game client expects) and
//! optionally deflate-compressed, with a CRC-32 guarding the decoded
//! bytes.
//!
//! ## Quick Start
//!
//! ### Inspecting an archive
//!
//! ```rust,no_run
//! use edfarc::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::open_path("game.edfa")?;
//!
//!     for entry in archive.entries() {
//!         println!("{}: {} bytes, flags {:#04x}",
//!             entry.id, entry.declared_len, entry.flags);
//!     }
//!
//!     let payload = archive.get(0)?;
//!     println!("first entry holds {} bytes", payload.len());
//!     Ok(())
//! }
//! ```
//!
//! ### Editing and saving
//!
//! ```rust,no_run
//! use edfarc::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::open_path("game.edfa")?;
//!
//!     archive.replace(3, b"new payload".to_vec())?;
//!     archive.append(b"appended entry".to_vec());
//!     archive.remove(1)?;
//!
//!     // Untouched entries are copied byte-for-byte, so the diff against
//!     // the original file stays minimal.
//!     archive.save_path("game.edfa")?;
//!     Ok(())
//! }
//! ```
//!
//! ### Building an archive from scratch
//!
//! ```rust
//! use edfarc::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::new();
//!     archive.append(b"credits text".to_vec());
//!     archive.append(b"jukebox tracks".to_vec());
//!
//!     let mut bytes = Vec::new();
//!     archive.save(&mut bytes)?;
//!     assert_eq!(&bytes[..4], b"EDFA");
//!     Ok(())
//! }
//! ```
//!
//! ## Validation
//!
//! Loading a damaged archive does not necessarily fail: descriptor range
//! problems are recorded as [`Issue`]s so an editor can show the user
//! everything that is wrong at once. Saving is refused while any fatal
//! issue is unresolved.
//!
//! ```rust,no_run
//! use edfarc::Archive;
//!
//! # fn main() -> edfarc::Result<()> {
//! let archive = Archive::open_path("damaged.edfa")?;
//! for issue in archive.validate() {
//!     eprintln!("{issue}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`; see [`Error`] for the taxonomy.
//!
//! ## Concurrency
//!
//! The core is single-threaded and synchronous. An [`Archive`] provides
//! no internal locking; callers sharing one across threads must
//! serialize access around it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive;
pub mod codec;
pub mod cursor;
pub mod error;
pub mod format;
pub mod meta;
pub mod validate;

pub use archive::{Archive, EntryInfo};
pub use error::{Error, Result};
pub use meta::{EntryKind, Language};
pub use validate::{Issue, IssueKind};
