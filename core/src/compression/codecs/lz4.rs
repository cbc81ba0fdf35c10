//! codecs/lz4.rs
//! LZ4 frame compressor, one self-contained frame per block.
//!
//! Frames are decoded with `lz4_flex::frame::FrameDecoder`, which walks
//! concatenated frames and fails on a frame cut short.
use std::io::Write;

use crate::buffer::{BufferPool, WindowBuffer};
use crate::compression::constants::MAX_BLOCK_SIZE;
use crate::compression::types::{BlockCompressor, BlockFlags, CompressionCodec, CompressionError};
use crate::utils::compress_bound_hint;

pub struct Lz4BlockCompressor {
    level: u32,
}

impl Lz4BlockCompressor {
    pub fn new(level: i32) -> Result<Self, CompressionError> {
        if !CompressionCodec::Lz4.level_range().contains(&level) {
            return Err(CompressionError::InvalidLevel { codec: CompressionCodec::Lz4, level });
        }
        Ok(Self { level: level as u32 })
    }
}

impl<P: BufferPool> BlockCompressor<P> for Lz4BlockCompressor {
    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Lz4
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

        out.reserve(compress_bound_hint(input.len()))?;
        let before = out.end();

        // The encoder writes through the buffer's auto-expanding `Write` impl.
        let mut encoder = lz4::EncoderBuilder::new()
            .level(self.level)
            .build(&mut *out)
            .map_err(|e| CompressionError::CodecInitFailed { codec: "lz4", msg: e.to_string() })?;
        encoder
            .write_all(input)
            .map_err(|e| CompressionError::from_codec_io(CompressionCodec::Lz4, e))?;
        let (_, result) = encoder.finish();
        result.map_err(|e| CompressionError::from_codec_io(CompressionCodec::Lz4, e))?;

        Ok(out.end() - before)
    }
}
