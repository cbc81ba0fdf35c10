//! compression/dictionary.rs
//! Carries the deflate history window from one block to the next.
//!
//! Design notes:
//! - A block of at least 32 KiB is its successor's dictionary as is: the next
//!   job gets another reference to the same pooled input buffer, no copy.
//! - Shorter blocks are stitched onto the tail of the previous window in a fresh
//!   32 KiB buffer, so the window always covers the last 32 KiB of input.
//! - Dictionaries are only ever read after they are built, so any number of
//!   holders can prime from one concurrently.

use std::sync::Arc;

use crate::buffer::{BlockPool, BufferError, BufferPool, SharedWindowBuffer};
use crate::compression::constants::DEFLATE_DICTIONARY_SIZE;
use crate::compression::types::{BlockCompressor, CompressionError};

pub struct DictionaryChain<P: BufferPool = BlockPool> {
    pool: Arc<P>,
    next: Option<SharedWindowBuffer<P>>,
}

impl<P: BufferPool> DictionaryChain<P> {
    pub fn new(pool: &Arc<P>) -> Self {
        Self { pool: Arc::clone(pool), next: None }
    }

    /// A reference to the history for the block about to be dispatched.
    /// `None` before the first block.
    pub fn current(&self) -> Option<SharedWindowBuffer<P>> {
        self.next.as_ref().map(SharedWindowBuffer::acquire_ref)
    }

    /// Append `input` to the history seen by the following block.
    pub fn advance(&mut self, input: &SharedWindowBuffer<P>) -> Result<(), BufferError> {
        let len = input.readable_len();
        if len >= DEFLATE_DICTIONARY_SIZE {
            self.replace(input.acquire_ref());
            return Ok(());
        }

        let window = SharedWindowBuffer::new(&self.pool, DEFLATE_DICTIONARY_SIZE)?;
        {
            let mut dst = window.lock();
            if let Some(prev) = self.next.take() {
                let keep = DEFLATE_DICTIONARY_SIZE - len;
                prev.with_readable(|bytes| dst.write(&bytes[bytes.len().saturating_sub(keep)..], false))?;
                prev.release_ref();
            }
            input.with_readable(|bytes| dst.write(bytes, false))?;
        }
        self.replace(window);
        Ok(())
    }

    fn replace(&mut self, window: SharedWindowBuffer<P>) {
        if let Some(old) = self.next.replace(window) {
            old.release_ref();
        }
    }
}

/// Prime `compressor` from `dictionary` and give the reference up.
pub fn prime_from<P: BufferPool>(
    compressor: &mut dyn BlockCompressor<P>,
    dictionary: SharedWindowBuffer<P>,
) -> Result<(), CompressionError> {
    let primed = dictionary.with_readable(|bytes| compressor.prime(bytes));
    dictionary.release_ref();
    primed
}
