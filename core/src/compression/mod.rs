//! compression/mod.rs
//! Codec adapters over pooled window buffers.
//!
//! Notes:
//! - Block compressors turn one input block into one independently produced unit
//!   (sync-flushed deflate, or a whole lz4/zstd/xz frame) so blocks can be
//!   compressed on any thread and stitched together in order.
//! - Deflate blocks are primed with the 32 KiB of input before them
//!   (`dictionary`), which keeps the ratio close to a single-threaded deflate.
//! - zlib/gzip framing and checksums are added around the deflate blocks by
//!   `container` and `checksum`.
//! - Decoding uses the codec crates' streaming readers, which accept the
//!   concatenated units.

pub mod constants;
pub mod types;
pub mod checksum;
pub mod container;
pub mod dictionary;
pub mod registry;
pub mod codecs;
pub mod stream;

pub use constants::*;
pub use types::*;
pub use checksum::*;
pub use dictionary::*;
pub use registry::*;
pub use stream::*;
