//! compress-core
//!
//! Pooled, reference-counted window buffers and the streaming compression
//! adapters built on them. Pure Rust API; codecs come from their crates.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

// Buffers and what runs on them
pub mod buffer;
pub mod compression;
pub mod telemetry;

// Stream layers
pub mod parallel;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::buffer::{BlockPool, BufferError, BufferPool, PoolConfig, SharedWindowBuffer, WindowBuffer};
    pub use crate::compression::{
        compress_stream, decompress_stream, BlockCompressor, CodecOptions, CompressionCodec, CompressionError,
    };
    pub use crate::parallel::{run_compress_pipeline, ParallelConfig, ParallelismProfile};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::StreamError;
}
