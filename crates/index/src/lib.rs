//! # Index - memory-mapped segment index
//!
//! Maps a segment-relative record number to the byte position of that
//! record in the segment's append-only data file. Lookups are O(1): the
//! index file is memory-mapped and entries are fixed width, so "entry N"
//! lives at byte `N * 12`.
//!
//! ## Entry layout
//!
//! ```text
//! [offset: u32 LE][position: u64 LE]   (12 bytes, back to back)
//! ```
//!
//! ## Capacity
//!
//! A mapping cannot grow, so [`Index::open`] extends the file to
//! `max_index_bytes` before mapping it and [`Index::close`] trims it back to
//! the bytes actually written. Once the reserved region is full, `write`
//! returns [`IndexError::Eof`] and the caller rolls over to a new segment.
//!
//! ## Example
//!
//! ```rust,no_run
//! use config::SegmentConfig;
//! use index::{Index, Selector};
//!
//! let cfg = SegmentConfig { max_index_bytes: 1024, sync_writes: false };
//! let mut idx = Index::open("00000000000000000000.index", &cfg).unwrap();
//! idx.write(0, 0).unwrap();
//! idx.write(1, 12).unwrap();
//! assert_eq!(idx.read(Selector::Last).unwrap().position, 12);
//! idx.close().unwrap();
//! ```

mod format;
mod index;
mod shared;

use std::io;

use thiserror::Error;

pub use format::{Entry, Selector, ENTRY_WIDTH, OFFSET_WIDTH, POSITION_WIDTH};
pub use index::Index;
pub use shared::SharedIndex;

/// Errors returned by index operations.
///
/// [`IndexError::Eof`] is a normal control-flow signal ("no such entry" or
/// "index full"); the other variants are operational faults.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Read past the written entries, or write into a full index.
    #[error("end of index")]
    Eof,

    /// An underlying I/O error (stat, truncate, map, flush, sync).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The supplied configuration cannot back an index.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The existing file is longer than the configured `max_index_bytes`.
    #[error("index file length {len} exceeds max_index_bytes {max}")]
    Oversized {
        /// On-disk length found at open.
        len: u64,
        /// Configured `max_index_bytes`.
        max: u64,
    },
}

impl IndexError {
    /// Returns `true` for the end-of-data condition.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, IndexError::Eof)
    }
}

#[cfg(test)]
mod tests;
