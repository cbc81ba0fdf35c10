//! codecs/xz.rs
//! XZ block compressor: one complete .xz stream per block.
//!
//! xz readers accept concatenated streams, so blocks compressed on
//! different threads still decode as one file.
use std::io::Write;

use xz2::write::XzEncoder;

use crate::buffer::{BufferPool, WindowBuffer};
use crate::compression::constants::MAX_BLOCK_SIZE;
use crate::compression::types::{BlockCompressor, BlockFlags, CompressionCodec, CompressionError};
use crate::utils::compress_bound_hint;

pub struct XzBlockCompressor {
    preset: u32,
}

impl XzBlockCompressor {
    pub fn new(level: i32) -> Result<Self, CompressionError> {
        if !CompressionCodec::Xz.level_range().contains(&level) {
            return Err(CompressionError::InvalidLevel { codec: CompressionCodec::Xz, level });
        }
        Ok(Self { preset: level as u32 })
    }
}

impl<P: BufferPool> BlockCompressor<P> for XzBlockCompressor {
    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Xz
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

        let mut encoder = XzEncoder::new(&mut *out, self.preset);
        encoder
            .write_all(input)
            .map_err(|e| CompressionError::from_codec_io(CompressionCodec::Xz, e))?;
        encoder
            .finish()
            .map_err(|e| CompressionError::from_codec_io(CompressionCodec::Xz, e))?;

        Ok(out.end() - before)
    }
}
