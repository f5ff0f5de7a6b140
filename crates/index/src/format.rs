//! Index entry layout and the codec for a single entry.
//!
//! ```text
//! [offset: u32 LE][position: u64 LE]
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::IndexError;

/// Width of the `offset` field in bytes.
pub const OFFSET_WIDTH: u64 = 4;

/// Width of the `position` field in bytes.
pub const POSITION_WIDTH: u64 = 8;

/// Width of one entry in bytes: 4 (`offset`) + 8 (`position`).
pub const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

pub(crate) const OFFSET_LEN: usize = OFFSET_WIDTH as usize;
pub(crate) const ENTRY_LEN: usize = ENTRY_WIDTH as usize;

/// One `(offset, position)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Record number relative to the segment's base offset.
    pub offset: u32,
    /// Byte position of the record in the data file.
    pub position: u64,
}

impl Entry {
    /// Builds an entry from its two fields.
    pub fn new(offset: u32, position: u64) -> Self {
        Self { offset, position }
    }

    /// Writes the entry into the first [`ENTRY_WIDTH`] bytes of `buf`.
    ///
    /// Returns [`IndexError::Eof`] if `buf` is too short; nothing is written
    /// in that case.
    pub fn encode(&self, buf: &mut [u8]) -> Result<(), IndexError> {
        let slot = buf.get_mut(..ENTRY_LEN).ok_or(IndexError::Eof)?;
        let (off, pos) = slot.split_at_mut(OFFSET_LEN);
        LittleEndian::write_u32(off, self.offset);
        LittleEndian::write_u64(pos, self.position);
        Ok(())
    }

    /// Reads an entry from the first [`ENTRY_WIDTH`] bytes of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self, IndexError> {
        let slot = buf.get(..ENTRY_LEN).ok_or(IndexError::Eof)?;
        Ok(Self::from_slot(slot))
    }

    /// `slot` must be exactly one entry long.
    pub(crate) fn from_slot(slot: &[u8]) -> Self {
        let (off, pos) = slot.split_at(OFFSET_LEN);
        Self {
            offset: LittleEndian::read_u32(off),
            position: LittleEndian::read_u64(pos),
        }
    }
}

/// Which entry [`Index::read`](crate::Index::read) should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The entry at this 0-based position within the index.
    Nth(u64),
    /// The most recently written entry.
    Last,
}

impl From<u64> for Selector {
    fn from(n: u64) -> Self {
        Selector::Nth(n)
    }
}
