use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use config::SegmentConfig;
use memmap2::MmapMut;
use tracing::{debug, trace, warn};

use crate::format::{Entry, Selector, ENTRY_LEN, ENTRY_WIDTH};
use crate::IndexError;

/// A fixed-capacity, memory-mapped index over one segment's records.
///
/// The backing file is extended to `max_index_bytes` and mapped shared,
/// read/write. `size` marks the end of the written entries inside the
/// mapping; everything after it is reserved space.
///
/// # Concurrency
///
/// An `Index` does no locking. It assumes a single owner that serializes
/// writes, which `&mut self` on [`write`](Index::write) enforces. Wrap it in
/// a [`SharedIndex`](crate::SharedIndex) to share it across threads.
///
/// # Durability
///
/// Writes land in the mapped pages and are visible to readers immediately,
/// but are only guaranteed on disk after [`flush`](Index::flush),
/// [`close`](Index::close), or when `sync_writes` is set in the config.
pub struct Index {
    path: PathBuf,
    file: File,
    /// `None` once the region has been released by `close` or drop.
    mmap: Option<MmapMut>,
    /// Bytes of written entries; always a multiple of `ENTRY_WIDTH`.
    size: u64,
    sync_writes: bool,
    closed: bool,
}

impl Index {
    /// Opens (or creates) the index file at `path` without truncating it,
    /// then maps it as [`Index::from_file`] does.
    pub fn open<P: AsRef<Path>>(path: P, config: &SegmentConfig) -> Result<Self, IndexError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        Self::from_file(file, path.as_ref(), config)
    }

    /// Builds an index over an already-open, writable `file` living at `path`.
    ///
    /// The file's current length becomes the initial size, so reopening a
    /// closed index resumes after its last entry. A length that ends in a
    /// partial entry is rounded down to the last whole one. The file is then
    /// extended to `config.max_index_bytes` and mapped.
    ///
    /// # Errors
    ///
    /// - [`IndexError::InvalidConfig`] if `max_index_bytes` is zero or does
    ///   not fit the address space.
    /// - [`IndexError::Oversized`] if the existing length exceeds
    ///   `max_index_bytes`.
    /// - [`IndexError::Io`] if stat, resize or mapping fails.
    pub fn from_file<P: Into<PathBuf>>(
        file: File,
        path: P,
        config: &SegmentConfig,
    ) -> Result<Self, IndexError> {
        let path = path.into();
        let max = config.max_index_bytes;
        if max == 0 {
            return Err(IndexError::InvalidConfig(
                "max_index_bytes must be > 0".to_string(),
            ));
        }
        if usize::try_from(max).is_err() {
            return Err(IndexError::InvalidConfig(format!(
                "max_index_bytes {} exceeds the addressable range",
                max
            )));
        }

        let len = file.metadata()?.len();
        if len > max {
            return Err(IndexError::Oversized { len, max });
        }
        let size = len - len % ENTRY_WIDTH;
        if size != len {
            warn!(
                path = %path.display(),
                len,
                size,
                "index ends in a partial entry; ignoring trailing bytes"
            );
        }

        file.set_len(max)?;

        // SAFETY: the mapping is tied to `file`, which the index owns for as
        // long as the mapping lives. Every access goes through bounds-checked
        // slices of the mapped region. Segment files are private to the log,
        // so no other process truncates them underneath us.
        let mmap = match unsafe { MmapMut::map_mut(&file) } {
            Ok(m) => m,
            Err(e) => {
                // Leave the file the way we found it.
                if let Err(rollback) = file.set_len(len) {
                    warn!(
                        path = %path.display(),
                        error = %rollback,
                        "failed to restore index length after map failure"
                    );
                }
                return Err(e.into());
            }
        };

        debug!(
            path = %path.display(),
            entries = size / ENTRY_WIDTH,
            capacity = max,
            "opened index"
        );

        Ok(Self {
            path,
            file,
            mmap: Some(mmap),
            size,
            sync_writes: config.sync_writes,
            closed: false,
        })
    }

    /// Returns the entry picked by `selector`.
    ///
    /// Returns [`IndexError::Eof`] if the index is empty or the entry lies
    /// beyond the written region.
    pub fn read(&self, selector: Selector) -> Result<Entry, IndexError> {
        if self.size == 0 {
            return Err(IndexError::Eof);
        }

        let n = match selector {
            Selector::Nth(n) => n,
            Selector::Last => self.size / ENTRY_WIDTH - 1,
        };
        let start = n.checked_mul(ENTRY_WIDTH).ok_or(IndexError::Eof)?;
        let end = start.checked_add(ENTRY_WIDTH).ok_or(IndexError::Eof)?;
        if end > self.size {
            return Err(IndexError::Eof);
        }

        Entry::decode(self.region(start, end).ok_or(IndexError::Eof)?)
    }

    /// Appends `(offset, position)` after the last written entry.
    ///
    /// Returns [`IndexError::Eof`] without touching the index when the
    /// reserved region has no room for another entry.
    pub fn write(&mut self, offset: u32, position: u64) -> Result<(), IndexError> {
        let start = self.size;
        let end = start + ENTRY_WIDTH;
        if self.capacity() < end {
            trace!(path = %self.path.display(), size = self.size, "index full");
            return Err(IndexError::Eof);
        }

        // end <= capacity, which fit in usize at open.
        let (start, end) = (start as usize, end as usize);
        let mmap = self.mmap.as_mut().ok_or(IndexError::Eof)?;
        let slot = mmap.get_mut(start..end).ok_or(IndexError::Eof)?;
        Entry::new(offset, position).encode(slot)?;

        if self.sync_writes {
            mmap.flush_range(start, ENTRY_LEN)?;
        }

        self.size += ENTRY_WIDTH;
        Ok(())
    }

    /// Synchronously flushes the mapped region to the backing file.
    pub fn flush(&self) -> Result<(), IndexError> {
        if let Some(mmap) = &self.mmap {
            mmap.flush()?;
        }
        Ok(())
    }

    /// Flushes and unmaps the index, then trims the file to the written
    /// entries and closes it.
    ///
    /// Steps run in order and stop at the first failure; after an error the
    /// file may still carry its reserved tail.
    pub fn close(mut self) -> Result<(), IndexError> {
        self.closed = true;
        self.release()
    }

    /// Path of the backing file.
    pub fn name(&self) -> &Path {
        &self.path
    }

    /// Number of written entries.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.size / ENTRY_WIDTH
    }

    /// Returns `true` if no entry has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Bytes holding written entries.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes reserved by the mapping.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.mmap.as_ref().map_or(0, |m| m.len() as u64)
    }

    /// Returns `true` when the next `write` would report EOF.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity() < self.size + ENTRY_WIDTH
    }

    /// Iterates over the written entries in append order.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        self.region(0, self.size)
            .unwrap_or(&[])
            .chunks_exact(ENTRY_LEN)
            .map(Entry::from_slot)
    }

    fn region(&self, start: u64, end: u64) -> Option<&[u8]> {
        let mmap = self.mmap.as_ref()?;
        let start = usize::try_from(start).ok()?;
        let end = usize::try_from(end).ok()?;
        mmap.get(start..end)
    }

    fn release(&mut self) -> Result<(), IndexError> {
        if let Some(mmap) = &self.mmap {
            mmap.flush()?;
        }
        self.file.sync_all()?;

        // Unmap before shrinking; Windows refuses to truncate a mapped file.
        self.mmap = None;
        self.file.set_len(self.size)?;

        debug!(path = %self.path.display(), size = self.size, "closed index");
        Ok(())
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("path", &self.path)
            .field("entries", &self.len())
            .field("size", &self.size)
            .field("capacity", &self.capacity())
            .field("sync_writes", &self.sync_writes)
            .finish()
    }
}

/// Best-effort close on drop.
///
/// An index dropped without [`Index::close`] still flushes and trims its
/// file, so a later open does not mistake the reserved zeroes for entries.
/// Errors are logged because `Drop` cannot return them.
impl Drop for Index {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.release() {
            warn!(path = %self.path.display(), error = %e, "failed to close index on drop");
        }
    }
}
