//! compression/types.rs
//! Codec identifiers, options, errors and the block compressor seam.
use std::fmt;
use std::io;
use std::ops::RangeInclusive;

use bitflags::bitflags;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::buffer::{BlockPool, BufferError, BufferPool, WindowBuffer};
use crate::compression::constants::*;
use crate::utils::enum_name_or_hex;

/// Supported codecs, with stable numeric ids.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// Raw deflate (RFC 1951).
    Deflate = codec_ids::DEFLATE,
    /// Deflate in a zlib wrapper (RFC 1950).
    Zlib    = codec_ids::ZLIB,
    /// Deflate in a gzip member (RFC 1952).
    Gzip    = codec_ids::GZIP,
    Xz      = codec_ids::XZ,
    /// LZ4 frame format.
    Lz4     = codec_ids::LZ4,
    Zstd    = codec_ids::ZSTD,
}

impl Default for CompressionCodec {
    fn default() -> Self {
        CompressionCodec::Zstd
    }
}

impl CompressionCodec {
    pub fn verify(raw: u16) -> Result<Self, CompressionError> {
        Self::try_from_primitive(raw)
            .map_err(|_| CompressionError::UnsupportedCodec { codec_id: raw })
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionCodec::Deflate => "deflate",
            CompressionCodec::Zlib    => "zlib",
            CompressionCodec::Gzip    => "gzip",
            CompressionCodec::Xz      => "xz",
            CompressionCodec::Lz4     => "lz4",
            CompressionCodec::Zstd    => "zstd",
        }
    }

    pub fn is_deflate_family(self) -> bool {
        matches!(self, CompressionCodec::Deflate | CompressionCodec::Zlib | CompressionCodec::Gzip)
    }

    pub fn default_level(self) -> i32 {
        match self {
            CompressionCodec::Deflate | CompressionCodec::Zlib | CompressionCodec::Gzip => DEFAULT_LEVEL_DEFLATE,
            CompressionCodec::Xz   => DEFAULT_LEVEL_XZ,
            CompressionCodec::Lz4  => DEFAULT_LEVEL_LZ4,
            CompressionCodec::Zstd => DEFAULT_LEVEL_ZSTD,
        }
    }

    pub fn level_range(self) -> RangeInclusive<i32> {
        match self {
            CompressionCodec::Deflate | CompressionCodec::Zlib | CompressionCodec::Gzip => LEVELS_DEFLATE,
            CompressionCodec::Xz   => LEVELS_XZ,
            CompressionCodec::Lz4  => LEVELS_LZ4,
            CompressionCodec::Zstd => LEVELS_ZSTD,
        }
    }

    pub fn default_block_size(self) -> usize {
        if self.is_deflate_family() {
            DEFAULT_BLOCK_SIZE_DEFLATE
        } else {
            DEFAULT_BLOCK_SIZE_FRAME
        }
    }
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-stream codec settings. `None` fields fall back to the codec defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    pub codec: CompressionCodec,
    pub level: Option<i32>,
    pub block_size: Option<usize>,
    /// Deflate family only: skip priming blocks with the preceding 32 KiB.
    /// Blocks then stand alone (pigz `-i`), at some cost in ratio.
    pub independent_blocks: bool,
}

impl CodecOptions {
    pub fn new(codec: CompressionCodec) -> Self {
        Self { codec, level: None, block_size: None, independent_blocks: false }
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    pub fn with_independent_blocks(mut self, independent: bool) -> Self {
        self.independent_blocks = independent;
        self
    }

    pub fn level(&self) -> i32 {
        self.level.unwrap_or_else(|| self.codec.default_level())
    }

    pub fn block_size(&self) -> usize {
        self.block_size.unwrap_or_else(|| self.codec.default_block_size())
    }

    pub fn validate(&self) -> Result<(), CompressionError> {
        let level = self.level();
        if !self.codec.level_range().contains(&level) {
            return Err(CompressionError::InvalidLevel { codec: self.codec, level });
        }
        let block_size = self.block_size();
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(CompressionError::InvalidBlockSize {
                have: block_size,
                min: MIN_BLOCK_SIZE,
                max: MAX_BLOCK_SIZE,
            });
        }
        Ok(())
    }
}

bitflags! {
    /// Position of a block within its stream.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct BlockFlags: u8 {
        const FIRST = 0b0000_0001;
        const LAST  = 0b0000_0010;
    }
}

impl BlockFlags {
    /// Both first and last: the stream has exactly one block.
    pub fn is_only(self) -> bool {
        self.contains(BlockFlags::FIRST | BlockFlags::LAST)
    }
}

#[derive(Debug)]
pub enum CompressionError {
    UnsupportedCodec { codec_id: u16 },
    InvalidLevel { codec: CompressionCodec, level: i32 },
    InvalidBlockSize { have: usize, min: usize, max: usize },
    CodecInitFailed { codec: &'static str, msg: String },
    CodecProcessFailed { codec: &'static str, msg: String },
    ChunkTooLarge { have: usize, max: usize },
    Buffer(BufferError),
    Io(io::Error),
    StateError(String),
}

impl CompressionError {
    /// Map an I/O error raised inside a codec, keeping buffer failures distinct.
    pub fn from_codec_io(codec: CompressionCodec, e: io::Error) -> Self {
        match BufferError::from_io(&e) {
            Some(b) => CompressionError::Buffer(b),
            None => CompressionError::CodecProcessFailed { codec: codec.name(), msg: e.to_string() },
        }
    }
}

impl From<BufferError> for CompressionError {
    fn from(e: BufferError) -> Self {
        CompressionError::Buffer(e)
    }
}

impl From<io::Error> for CompressionError {
    fn from(e: io::Error) -> Self {
        match BufferError::from_io(&e) {
            Some(b) => CompressionError::Buffer(b),
            None => CompressionError::Io(e),
        }
    }
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CompressionError::*;
        match self {
            UnsupportedCodec { codec_id } =>
                write!(f, "unsupported compression codec: {}",
                       enum_name_or_hex::<CompressionCodec>(*codec_id)),
            InvalidLevel { codec, level } => {
                let range = codec.level_range();
                write!(f, "invalid {} level {} (expected {}..={})", codec, level, range.start(), range.end())
            }
            InvalidBlockSize { have, min, max } =>
                write!(f, "invalid block size {} (expected {}..={})", have, min, max),
            CodecInitFailed { codec, msg } =>
                write!(f, "codec {} init failed: {}", codec, msg),
            CodecProcessFailed { codec, msg } =>
                write!(f, "codec {} process failed: {}", codec, msg),
            ChunkTooLarge { have, max } =>
                write!(f, "chunk too large: {} > {}", have, max),
            Buffer(e) =>
                write!(f, "buffer error: {}", e),
            Io(e) =>
                write!(f, "I/O error: {}", e),
            StateError(msg) =>
                write!(f, "compression state error: {}", msg),
        }
    }
}

impl std::error::Error for CompressionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompressionError::Buffer(e) => Some(e),
            CompressionError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Compresses one block at a time into a pooled output buffer.
///
/// Each call appends an independently produced unit to `out`; concatenating the
/// units of a stream in sequence order yields a stream the standard decoder reads.
// Require Send so boxed compressors can move into worker threads.
pub trait BlockCompressor<P: BufferPool = BlockPool>: Send {
    fn codec(&self) -> CompressionCodec;

    /// Compress `input`, appending to `out`. Returns the bytes produced.
    fn compress_block(
        &mut self,
        input: &[u8],
        out: &mut WindowBuffer<P>,
        flags: BlockFlags,
    ) -> Result<usize, CompressionError>;

    /// Whether blocks should be primed with the input that precedes them.
    fn uses_dictionary(&self) -> bool {
        false
    }

    /// Seed the next `compress_block` with `dictionary` as history.
    /// Codecs without dictionary support ignore it.
    fn prime(&mut self, _dictionary: &[u8]) -> Result<(), CompressionError> {
        Ok(())
    }
}
