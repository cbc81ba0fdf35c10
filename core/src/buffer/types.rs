//! buffer/types.rs
//! Error taxonomy for pooled window buffers.
//!
//! Design notes:
//! - Every fallible buffer operation returns `BufferError`; nothing panics on bad input.
//! - `PreconditionViolation` carries the offending value and the accepted range.
//! - Converts into `io::Error` so buffers can sit behind `Read`/`Write` adapters
//!   without losing the original error (recover it with `BufferError::from_io`).

use std::io;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The pool could not supply a block of the requested size.
    #[error("allocation failed: pool could not supply {requested} bytes")]
    AllocationFailed { requested: usize },

    /// An argument fell outside its valid range; nothing was modified.
    #[error("precondition violated: {what} = {value} (valid range {min}..={max})")]
    PreconditionViolation {
        what: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    /// The buffer already returned its block to the pool.
    #[error("buffer used after release")]
    UseAfterRelease,
}

impl BufferError {
    pub(crate) fn out_of_range(what: &'static str, value: usize, min: usize, max: usize) -> Self {
        BufferError::PreconditionViolation { what, value, min, max }
    }

    /// Recover a `BufferError` that travelled through an `io::Error`.
    pub fn from_io(err: &io::Error) -> Option<BufferError> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<BufferError>())
            .cloned()
    }
}

impl From<BufferError> for io::Error {
    fn from(e: BufferError) -> Self {
        let kind = match e {
            BufferError::AllocationFailed { .. } => io::ErrorKind::OutOfMemory,
            BufferError::PreconditionViolation { .. } => io::ErrorKind::InvalidInput,
            BufferError::UseAfterRelease => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}
