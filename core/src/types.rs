use std::io;

use crate::buffer::BufferError;
use crate::compression::CompressionError;

/// Unified stream error covering I/O, buffer, compression, and pipeline failures.
/// - Ergonomic `From<T>` impls enable `?` across the pipeline.
/// - Messages aim to be stable and contextual for telemetry and logs.
#[derive(Debug)]
pub enum StreamError {
    /// I/O error from the caller's reader or writer.
    Io(io::Error),

    /// Pooled buffer failure (allocation, bad cursor, use after release).
    Buffer(BufferError),

    /// Compression/decompression error.
    Compression(CompressionError),

    /// Pipeline wiring error (lost block, closed channel, thread failure).
    PipelineError(&'static str),

    /// Generic high-level validation with a descriptive message.
    Validation(String),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "I/O error: {}", e),
            StreamError::Buffer(e) => write!(f, "buffer error: {}", e),
            StreamError::Compression(e) => write!(f, "compression error: {}", e),
            StreamError::PipelineError(msg) => write!(f, "pipeline error: {}", msg),
            StreamError::Validation(msg) => write!(f, "validation error: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            StreamError::Buffer(e) => Some(e),
            StreamError::Compression(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        match BufferError::from_io(&e) {
            Some(b) => StreamError::Buffer(b),
            None => StreamError::Io(e),
        }
    }
}

impl From<BufferError> for StreamError {
    fn from(e: BufferError) -> Self {
        StreamError::Buffer(e)
    }
}

impl From<CompressionError> for StreamError {
    fn from(e: CompressionError) -> Self {
        match e {
            // Keep buffer failures recognizable at the top level.
            CompressionError::Buffer(b) => StreamError::Buffer(b),
            other => StreamError::Compression(other),
        }
    }
}
