//! A thread-safe handle over an [`Index`].
//!
//! `Index` itself assumes a single owner. `SharedIndex` puts it behind a
//! mutex so a reader thread and the appending segment can share it. Every
//! call takes the lock for its whole duration, so a read never observes a
//! half-written entry.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Entry, Index, IndexError, Selector};

/// Cloneable, lock-protected handle to one [`Index`].
#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<Mutex<Index>>,
    path: PathBuf,
}

impl SharedIndex {
    /// Moves `index` behind a new lock.
    pub fn new(index: Index) -> Self {
        let path = index.name().to_path_buf();
        Self {
            inner: Arc::new(Mutex::new(index)),
            path,
        }
    }

    /// See [`Index::read`].
    pub fn read(&self, selector: Selector) -> Result<Entry, IndexError> {
        self.lock().read(selector)
    }

    /// See [`Index::write`].
    pub fn write(&self, offset: u32, position: u64) -> Result<(), IndexError> {
        self.lock().write(offset, position)
    }

    /// Appends an entry and returns the entry number it was stored at.
    ///
    /// Concurrent writers use this to learn their slot without a second,
    /// racy call to `len`.
    pub fn append(&self, offset: u32, position: u64) -> Result<u64, IndexError> {
        let mut index = self.lock();
        let n = index.len();
        index.write(offset, position)?;
        Ok(n)
    }

    /// See [`Index::flush`].
    pub fn flush(&self) -> Result<(), IndexError> {
        self.lock().flush()
    }

    /// See [`Index::len`].
    #[must_use]
    pub fn len(&self) -> u64 {
        self.lock().len()
    }

    /// See [`Index::is_empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Path of the backing file.
    pub fn name(&self) -> &Path {
        &self.path
    }

    /// Releases this handle. The last handle to be closed closes the index
    /// itself and reports the outcome; earlier calls always succeed.
    pub fn close(self) -> Result<(), IndexError> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .close(),
            Err(_) => Ok(()),
        }
    }

    // `size` only advances after an entry is fully encoded, so a panic while
    // holding the lock cannot leave a partial entry visible.
    fn lock(&self) -> MutexGuard<'_, Index> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Index> for SharedIndex {
    fn from(index: Index) -> Self {
        Self::new(index)
    }
}
