//! src/compression/codecs/zstd.rs
//!
//! Zstd block compressor.
//!
//! Design notes:
//! - Each block becomes one complete zstd frame; the zstd decoder reads
//!   concatenated frames as one stream.
//! - The output window is grown to `compress_bound` up front, then the frame is
//!   written in place with the bulk API and the cursor advanced.
//! - The compression context is reused across blocks.

use crate::buffer::{BufferPool, WindowBuffer};
use crate::compression::constants::MAX_BLOCK_SIZE;
use crate::compression::types::{BlockCompressor, BlockFlags, CompressionCodec, CompressionError};

pub struct ZstdBlockCompressor {
    ctx: zstd::bulk::Compressor<'static>,
}

impl ZstdBlockCompressor {
    pub fn new(level: i32) -> Result<Self, CompressionError> {
        if !CompressionCodec::Zstd.level_range().contains(&level) {
            return Err(CompressionError::InvalidLevel { codec: CompressionCodec::Zstd, level });
        }
        let ctx = zstd::bulk::Compressor::new(level)
            .map_err(|e| CompressionError::CodecInitFailed { codec: "zstd", msg: e.to_string() })?;
        Ok(Self { ctx })
    }
}

impl<P: BufferPool> BlockCompressor<P> for ZstdBlockCompressor {
    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Zstd
    }

    fn compress_block(
        &mut self,
        input: &[u8],
        out: &mut WindowBuffer<P>,
        flags: BlockFlags,
    ) -> Result<usize, CompressionError> {
        if input.len() > MAX_BLOCK_SIZE {
            return Err(CompressionError::ChunkTooLarge { have: input.len(), max: MAX_BLOCK_SIZE });
        }
        if input.is_empty() && !flags.is_only() {
            return Ok(0);
        }

        out.reserve(zstd_safe::compress_bound(input.len()))?;
        let n = self
            .ctx
            .compress_to_buffer(input, out.writable_mut())
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "zstd", msg: e.to_string() })?;
        out.commit(n)?;
        Ok(n)
    }
}
