//! compression/constants.rs
//! Stable codec ids, level ranges and block-size defaults.

use std::ops::RangeInclusive;

/// Stable codec ids (u16), used for logging and config.
pub mod codec_ids {
    pub const DEFLATE: u16 = 0x0001;
    pub const ZLIB: u16    = 0x0002;
    pub const GZIP: u16    = 0x0003;
    pub const XZ: u16      = 0x0004;
    pub const LZ4: u16     = 0x0005;
    pub const ZSTD: u16    = 0x0006;
}

/// Default compression levels (balanced).
pub const DEFAULT_LEVEL_DEFLATE: i32 = 6;
pub const DEFAULT_LEVEL_XZ: i32 = 6;
pub const DEFAULT_LEVEL_LZ4: i32 = 0; // fast mode
pub const DEFAULT_LEVEL_ZSTD: i32 = 3;

pub const LEVELS_DEFLATE: RangeInclusive<i32> = 0..=9;
pub const LEVELS_XZ: RangeInclusive<i32> = 0..=9;
pub const LEVELS_LZ4: RangeInclusive<i32> = 0..=12;
pub const LEVELS_ZSTD: RangeInclusive<i32> = 1..=22;

/// Deflate-family block size, same as pigz (128 KiB).
pub const DEFAULT_BLOCK_SIZE_DEFLATE: usize = 128 * 1024;
/// Block size for frame codecs (lz4, zstd, xz).
pub const DEFAULT_BLOCK_SIZE_FRAME: usize = 1024 * 1024;

/// Deflate history window. Each block is primed with this much preceding input.
pub const DEFLATE_DICTIONARY_SIZE: usize = 32 * 1024;

/// Smallest block a stream will cut input into (4 KiB).
pub const MIN_BLOCK_SIZE: usize = 4 * 1024;
/// Max block size sanity bound (32 MiB).
pub const MAX_BLOCK_SIZE: usize = 32 * 1024 * 1024;

/// Staging buffer for decoders pumping into a writer.
pub const DEFAULT_DECODE_BUFFER_SIZE: usize = 64 * 1024;
