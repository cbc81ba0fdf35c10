//! src/compression/codecs/deflate.rs
//!
//! Deflate-family block compressor (raw deflate, zlib, gzip) via flate2.
//!
//! Design notes:
//! - Every block starts from a reset deflater primed with the last 32 KiB of the
//!   input before it, so blocks compress in any order yet still reference the
//!   preceding data, as pigz does. With `independent_blocks` the priming is
//!   skipped (pigz `-i`).
//! - Priming needs `Compress::set_dictionary`, which flate2 provides on its
//!   zlib-rs backend.
//! - Non-last blocks end in a sync flush, which byte-aligns the output; the last
//!   block finishes the stream. Concatenated in order they form one deflate stream.
//! - Output goes straight into the writable window of the pooled buffer; the
//!   buffer grows by 1.5x whenever deflate fills it.
//! - zlib/gzip framing lives in `container`; this adapter only ever emits raw deflate.

use flate2::{Compress, Compression, FlushCompress, Status};

use crate::buffer::{BufferPool, WindowBuffer};
use crate::compression::constants::{DEFLATE_DICTIONARY_SIZE, MAX_BLOCK_SIZE};
use crate::compression::types::{BlockCompressor, BlockFlags, CompressionCodec, CompressionError};
use crate::utils::{compress_bound_hint, expand_size};

pub struct DeflateBlockCompressor {
    codec: CompressionCodec,
    deflater: Compress,
    independent: bool,
    /// Set by `prime`; the next block keeps the primed state instead of resetting.
    primed: bool,
}

impl DeflateBlockCompressor {
    pub fn new(codec: CompressionCodec, level: i32) -> Result<Self, CompressionError> {
        if !codec.is_deflate_family() {
            return Err(CompressionError::CodecInitFailed {
                codec: codec.name(),
                msg: "not a deflate-family codec".into(),
            });
        }
        if !codec.level_range().contains(&level) {
            return Err(CompressionError::InvalidLevel { codec, level });
        }
        Ok(Self {
            codec,
            // false: raw deflate, the container writes its own framing
            deflater: Compress::new(Compression::new(level as u32), false),
            independent: false,
            primed: false,
        })
    }

    pub fn with_independent_blocks(mut self, independent: bool) -> Self {
        self.independent = independent;
        self
    }
}

impl<P: BufferPool> BlockCompressor<P> for DeflateBlockCompressor {
    fn codec(&self) -> CompressionCodec {
        self.codec
    }

    fn uses_dictionary(&self) -> bool {
        !self.independent
    }

    fn prime(&mut self, dictionary: &[u8]) -> Result<(), CompressionError> {
        if self.independent || dictionary.is_empty() {
            return Ok(());
        }
        let start = dictionary.len().saturating_sub(DEFLATE_DICTIONARY_SIZE);
        self.deflater.reset();
        self.deflater
            .set_dictionary(&dictionary[start..])
            .map_err(|e| CompressionError::CodecProcessFailed {
                codec: self.codec.name(),
                msg: format!("set_dictionary: {}", e),
            })?;
        self.primed = true;
        Ok(())
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
        let last = flags.contains(BlockFlags::LAST);
        let primed = std::mem::take(&mut self.primed);
        if input.is_empty() && !last {
            return Ok(0);
        }

        if !primed {
            self.deflater.reset();
        }
        let flush = if last { FlushCompress::Finish } else { FlushCompress::Sync };
        out.reserve(compress_bound_hint(input.len()))?;

        let produced_before = out.end();
        let mut consumed = 0usize;
        loop {
            if out.is_full() {
                out.expand(expand_size(out.capacity()))?;
            }

            let in_before = self.deflater.total_in();
            let out_before = self.deflater.total_out();
            let status = self
                .deflater
                .compress(&input[consumed..], out.writable_mut(), flush)
                .map_err(|e| CompressionError::CodecProcessFailed {
                    codec: self.codec.name(),
                    msg: e.to_string(),
                })?;
            consumed += (self.deflater.total_in() - in_before) as usize;
            out.commit((self.deflater.total_out() - out_before) as usize)?;

            match status {
                Status::StreamEnd => break,
                // A flush is complete once deflate stops filling the output.
                Status::Ok | Status::BufError if !last && consumed == input.len() && !out.is_full() => break,
                Status::Ok | Status::BufError => {}
            }
        }

        Ok(out.end() - produced_before)
    }
}
