//! buffer/window.rs
//! Pooled byte buffer with a readable and a writable window.
//!
//! Design notes:
//! - One block leased from a `BufferPool`; two cursors split it into
//!   `[start, end)` (readable) and `[end, capacity)` (writable).
//! - `0 <= start <= end <= capacity` holds after every call, including failed ones.
//! - `expand` and `trim_start` are all-or-nothing: the new block is leased first,
//!   so a failed lease leaves the buffer untouched.
//! - `&mut self` is the per-instance exclusion; `SharedWindowBuffer` adds a
//!   read-write lock when the same buffer crosses threads.
//! - Dropping the buffer releases it, so every exit path returns the block.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::buffer::pool::{BlockPool, BufferPool};
use crate::buffer::types::BufferError;

pub struct WindowBuffer<P: BufferPool = BlockPool> {
    pool: Arc<P>,
    block: Vec<u8>,
    /// Logical size; the leased block may be longer.
    capacity: usize,
    start: usize,
    end: usize,
    released: bool,
}

impl<P: BufferPool> WindowBuffer<P> {
    /// Lease a block of `capacity` bytes. A zero capacity leases nothing.
    pub fn new(pool: &Arc<P>, capacity: usize) -> Result<Self, BufferError> {
        let mut buf = Self::empty(pool);
        if capacity > 0 {
            buf.block = pool.lease(capacity)?;
            buf.capacity = capacity;
        }
        Ok(buf)
    }

    /// Zero-capacity buffer; the first write that needs room expands it.
    pub fn empty(pool: &Arc<P>) -> Self {
        Self {
            pool: Arc::clone(pool),
            block: Vec::new(),
            capacity: 0,
            start: 0,
            end: 0,
            released: false,
        }
    }

    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    // ============================================================
    // Cursor state
    // ============================================================

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn readable_len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn writable_len(&self) -> usize {
        self.capacity - self.end
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.end == self.capacity
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    #[inline]
    fn ensure_live(&self) -> Result<(), BufferError> {
        if self.released {
            return Err(BufferError::UseAfterRelease);
        }
        Ok(())
    }

    // ============================================================
    // Raw block access
    //
    // For zero-copy handoff to codec calls. Callers that write through
    // `writable_mut` report progress with `commit`/`set_end`.
    // ============================================================

    /// The whole logical block, `[0, capacity)`.
    pub fn as_slice(&self) -> &[u8] {
        &self.block[..self.capacity]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.block[..self.capacity]
    }

    /// The readable window, `[start, end)`.
    pub fn readable(&self) -> &[u8] {
        &self.block[self.start..self.end]
    }

    /// The writable window, `[end, capacity)`.
    pub fn writable_mut(&mut self) -> &mut [u8] {
        &mut self.block[self.end..self.capacity]
    }

    pub fn set_start(&mut self, start: usize) -> Result<(), BufferError> {
        self.ensure_live()?;
        if start > self.end {
            return Err(BufferError::out_of_range("start", start, 0, self.end));
        }
        self.start = start;
        Ok(())
    }

    pub fn set_end(&mut self, end: usize) -> Result<(), BufferError> {
        self.ensure_live()?;
        if end < self.start || end > self.capacity {
            return Err(BufferError::out_of_range("end", end, self.start, self.capacity));
        }
        self.end = end;
        Ok(())
    }

    /// Mark `n` bytes of the readable window as consumed.
    pub fn consume(&mut self, n: usize) -> Result<(), BufferError> {
        self.ensure_live()?;
        if n > self.readable_len() {
            return Err(BufferError::out_of_range("consume", n, 0, self.readable_len()));
        }
        self.start += n;
        Ok(())
    }

    /// Mark `n` bytes written directly into `writable_mut` as readable.
    pub fn commit(&mut self, n: usize) -> Result<(), BufferError> {
        self.ensure_live()?;
        if n > self.writable_len() {
            return Err(BufferError::out_of_range("commit", n, 0, self.writable_len()));
        }
        self.end += n;
        Ok(())
    }

    // ============================================================
    // Guarded operations
    // ============================================================

    /// Copy up to `dst.len()` readable bytes out, advancing `start`.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize, BufferError> {
        self.ensure_live()?;
        let n = dst.len().min(self.readable_len());
        if n == 0 {
            return Ok(0);
        }
        dst[..n].copy_from_slice(&self.block[self.start..self.start + n]);
        self.start += n;
        Ok(n)
    }

    /// Append `src` to the writable window.
    ///
    /// Without `auto_expand` only what fits is copied and the count is returned,
    /// so the caller can resubmit the rest. With `auto_expand` the buffer grows
    /// first and the write is all-or-nothing.
    pub fn write(&mut self, src: &[u8], auto_expand: bool) -> Result<usize, BufferError> {
        self.ensure_live()?;
        if src.is_empty() {
            return Ok(0);
        }

        let n = if self.writable_len() >= src.len() {
            src.len()
        } else if auto_expand {
            let target = self.grow_target(src.len())?;
            self.expand(target)?;
            src.len()
        } else {
            self.writable_len()
        };

        self.block[self.end..self.end + n].copy_from_slice(&src[..n]);
        self.end += n;
        Ok(n)
    }

    /// Grow to exactly `new_capacity`, keeping `[start, end)` at the same offsets.
    ///
    /// Shrinking is rejected. Equal capacity is a no-op.
    pub fn expand(&mut self, new_capacity: usize) -> Result<(), BufferError> {
        self.ensure_live()?;
        if new_capacity < self.capacity {
            return Err(BufferError::out_of_range(
                "new_capacity",
                new_capacity,
                self.capacity,
                usize::MAX,
            ));
        }
        if new_capacity == self.capacity {
            return Ok(());
        }

        // The pool may have handed out a longer block than asked for.
        if self.block.len() >= new_capacity {
            self.capacity = new_capacity;
            return Ok(());
        }

        let mut fresh = self.pool.lease(new_capacity)?;
        fresh[self.start..self.end].copy_from_slice(&self.block[self.start..self.end]);
        let old = std::mem::replace(&mut self.block, fresh);
        if !old.is_empty() {
            self.pool.reclaim(old);
        }
        self.capacity = new_capacity;
        Ok(())
    }

    /// Ensure at least `additional` writable bytes, growing if needed.
    pub fn reserve(&mut self, additional: usize) -> Result<(), BufferError> {
        self.ensure_live()?;
        if self.writable_len() >= additional {
            return Ok(());
        }
        let target = self.grow_target(additional)?;
        self.expand(target)
    }

    /// Discard `len` bytes from the front of the readable window and compact
    /// the rest to offset 0 in a fresh block of the same capacity.
    pub fn trim_start(&mut self, len: usize) -> Result<(), BufferError> {
        self.ensure_live()?;
        let readable = self.readable_len();
        if len > readable {
            return Err(BufferError::out_of_range("len", len, 0, readable));
        }
        if len == 0 {
            return Ok(());
        }

        let mut fresh = self.pool.lease(self.capacity)?;
        let tail = readable - len;
        let from = self.start + len;
        fresh[..tail].copy_from_slice(&self.block[from..self.end]);
        let old = std::mem::replace(&mut self.block, fresh);
        self.pool.reclaim(old);

        self.start = 0;
        self.end = tail;
        Ok(())
    }

    /// Reset both cursors to 0. Block contents are left as they are.
    pub fn clear(&mut self) -> Result<(), BufferError> {
        self.ensure_live()?;
        self.start = 0;
        self.end = 0;
        Ok(())
    }

    /// Return the block to the pool. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        let block = std::mem::take(&mut self.block);
        if !block.is_empty() {
            self.pool.reclaim(block);
        }
        self.capacity = 0;
        self.start = 0;
        self.end = 0;
        self.released = true;
    }

    // ============================================================
    // Stream helpers
    // ============================================================

    /// Read from `reader` into the writable window until it is full or the reader hits EOF.
    pub fn fill_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.ensure_live()?;
        let mut total = 0;
        while self.end < self.capacity {
            match reader.read(&mut self.block[self.end..self.capacity]) {
                Ok(0) => break,
                Ok(n) => {
                    self.end += n;
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// Write the whole readable window to `writer`, then clear.
    pub fn drain_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<usize> {
        self.ensure_live()?;
        let n = self.readable_len();
        writer.write_all(self.readable())?;
        self.start = 0;
        self.end = 0;
        Ok(n)
    }

    /// Growth policy for writes that do not fit: at least `needed` more than the
    /// current capacity, and at least 1.5x of it.
    fn grow_target(&self, needed: usize) -> Result<usize, BufferError> {
        let exact = self
            .capacity
            .checked_add(needed)
            .ok_or(BufferError::AllocationFailed { requested: usize::MAX })?;
        Ok(exact.max(self.capacity.saturating_add(self.capacity / 2)))
    }
}

impl<P: BufferPool> Drop for WindowBuffer<P> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<P: BufferPool> Read for WindowBuffer<P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(WindowBuffer::read(self, buf)?)
    }
}

impl<P: BufferPool> Write for WindowBuffer<P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(WindowBuffer::write(self, buf, true)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<P: BufferPool> fmt::Display for WindowBuffer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WBUF[{} - {}/{}] (data: {})",
            self.start,
            self.end,
            self.capacity,
            self.readable_len()
        )
    }
}

impl<P: BufferPool> fmt::Debug for WindowBuffer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowBuffer")
            .field("capacity", &self.capacity)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("block_len", &self.block.len())
            .field("released", &self.released)
            .finish()
    }
}
