//! buffer/shared.rs
//! Reference-counted window buffer for cross-thread handoff.
//!
//! Design notes:
//! - A handle is an `Arc<RwLock<WindowBuffer>>`. Acquiring a reference clones the
//!   handle, releasing one consumes it.
//! - The creator's handle is the first reference. Since `release_ref` takes the
//!   handle by value, no holder can release more often than it acquired.
//! - The block goes back to the pool when the last handle drops, once.
//! - The count governs lifetime only. Holders that mutate concurrently are
//!   serialized by the lock one operation at a time, not across operations.
//! - Read-only access takes the shared side of the lock, so several holders can
//!   read one block at once (a worker compressing its input while the next
//!   worker primes from the same bytes).

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::buffer::pool::{BlockPool, BufferPool};
use crate::buffer::types::BufferError;
use crate::buffer::window::WindowBuffer;

pub struct SharedWindowBuffer<P: BufferPool = BlockPool> {
    inner: Arc<RwLock<WindowBuffer<P>>>,
}

impl<P: BufferPool> SharedWindowBuffer<P> {
    pub fn new(pool: &Arc<P>, capacity: usize) -> Result<Self, BufferError> {
        Ok(Self::from_window(WindowBuffer::new(pool, capacity)?))
    }

    pub fn empty(pool: &Arc<P>) -> Self {
        Self::from_window(WindowBuffer::empty(pool))
    }

    /// Wrap an existing buffer; the returned handle holds the only reference.
    pub fn from_window(buf: WindowBuffer<P>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(buf)),
        }
    }

    /// Hand out another reference to the same buffer.
    #[must_use = "dropping the new reference releases it immediately"]
    pub fn acquire_ref(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Give up this reference. The last one returns the block to the pool.
    pub fn release_ref(self) {
        drop(self);
    }

    /// Live references, this one included.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Take the buffer back out when this is the last reference.
    pub fn into_window(self) -> Result<WindowBuffer<P>, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }

    /// Exclusive access for raw-block work spanning several calls.
    ///
    /// The lock is not reentrant: calling any other method on a handle to the
    /// same buffer while the guard is alive deadlocks.
    pub fn lock(&self) -> RwLockWriteGuard<'_, WindowBuffer<P>> {
        self.inner.write()
    }

    /// Shared read-only access. Other readers proceed; writers wait, so a
    /// mutating call on this buffer while the guard is alive deadlocks.
    pub fn view(&self) -> RwLockReadGuard<'_, WindowBuffer<P>> {
        self.inner.read()
    }

    // ============================================================
    // Guarded operations, one lock per call
    // ============================================================

    pub fn read(&self, dst: &mut [u8]) -> Result<usize, BufferError> {
        self.inner.write().read(dst)
    }

    pub fn write(&self, src: &[u8], auto_expand: bool) -> Result<usize, BufferError> {
        self.inner.write().write(src, auto_expand)
    }

    pub fn expand(&self, new_capacity: usize) -> Result<(), BufferError> {
        self.inner.write().expand(new_capacity)
    }

    pub fn trim_start(&self, len: usize) -> Result<(), BufferError> {
        self.inner.write().trim_start(len)
    }

    pub fn clear(&self) -> Result<(), BufferError> {
        self.inner.write().clear()
    }

    pub fn set_start(&self, start: usize) -> Result<(), BufferError> {
        self.inner.write().set_start(start)
    }

    pub fn set_end(&self, end: usize) -> Result<(), BufferError> {
        self.inner.write().set_end(end)
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn start(&self) -> usize {
        self.inner.read().start()
    }

    pub fn end(&self) -> usize {
        self.inner.read().end()
    }

    pub fn readable_len(&self) -> usize {
        self.inner.read().readable_len()
    }

    pub fn writable_len(&self) -> usize {
        self.inner.read().writable_len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.inner.read().is_released()
    }

    /// Run `f` over the readable window without moving the cursors.
    ///
    /// `f` runs under the read lock. Calling a mutating method (`write`, `read`,
    /// `clear`, `lock`, ...) on any handle to this buffer from inside `f`
    /// deadlocks. Nested reads can too once a writer is queued, so copy out what
    /// is needed instead.
    pub fn with_readable<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.inner.read().readable())
    }
}

impl<P: BufferPool> Clone for SharedWindowBuffer<P> {
    fn clone(&self) -> Self {
        self.acquire_ref()
    }
}

impl<P: BufferPool> fmt::Display for SharedWindowBuffer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} refs={}", &*self.inner.read(), self.ref_count())
    }
}

impl<P: BufferPool> fmt::Debug for SharedWindowBuffer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWindowBuffer")
            .field("refs", &self.ref_count())
            .field("buffer", &*self.inner.read())
            .finish()
    }
}
