//! compression/registry.rs
//! Codec registry and factory functions.

use std::io::Read;

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};

use crate::buffer::BufferPool;
use crate::compression::codecs::{DeflateBlockCompressor, Lz4BlockCompressor, XzBlockCompressor, ZstdBlockCompressor};
use crate::compression::types::{BlockCompressor, CodecOptions, CompressionCodec, CompressionError};

pub struct CodecInfo {
    pub codec: CompressionCodec,
    pub name: &'static str,
    pub default_level: i32,
    pub default_block_size: usize,
    /// Whether the stream carries a container checksum the pipeline must compute.
    pub has_container_checksum: bool,
}

pub fn resolve(codec_id: u16) -> Result<CodecInfo, CompressionError> {
    let codec = CompressionCodec::verify(codec_id)?;
    Ok(CodecInfo {
        codec,
        name: codec.name(),
        default_level: codec.default_level(),
        default_block_size: codec.default_block_size(),
        has_container_checksum: matches!(codec, CompressionCodec::Gzip | CompressionCodec::Zlib),
    })
}

/// Build a block compressor for `opts`. Options are validated first.
pub fn create_compressor<P: BufferPool>(opts: &CodecOptions)
    -> Result<Box<dyn BlockCompressor<P>>, CompressionError>
{
    opts.validate()?;
    let level = opts.level();
    let compressor: Box<dyn BlockCompressor<P>> = match opts.codec {
        CompressionCodec::Deflate | CompressionCodec::Zlib | CompressionCodec::Gzip =>
            Box::new(
                DeflateBlockCompressor::new(opts.codec, level)?.with_independent_blocks(opts.independent_blocks),
            ),
        CompressionCodec::Xz   => Box::new(XzBlockCompressor::new(level)?),
        CompressionCodec::Lz4  => Box::new(Lz4BlockCompressor::new(level)?),
        CompressionCodec::Zstd => Box::new(ZstdBlockCompressor::new(level)?),
    };
    Ok(compressor)
}

/// Wrap `reader` in a streaming decoder for `codec`.
///
/// Every decoder accepts the concatenated units the block compressors emit.
pub fn create_decoder<'a, R>(codec: CompressionCodec, reader: R)
    -> Result<Box<dyn Read + Send + 'a>, CompressionError>
where
    R: Read + Send + 'a,
{
    let decoder: Box<dyn Read + Send + 'a> = match codec {
        CompressionCodec::Deflate => Box::new(DeflateDecoder::new(reader)),
        CompressionCodec::Zlib    => Box::new(ZlibDecoder::new(reader)),
        CompressionCodec::Gzip    => Box::new(MultiGzDecoder::new(reader)),
        CompressionCodec::Xz      => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
        CompressionCodec::Lz4     => Box::new(lz4_flex::frame::FrameDecoder::new(reader)),
        CompressionCodec::Zstd    => Box::new(
            zstd::stream::read::Decoder::new(reader)
                .map_err(|e| CompressionError::CodecInitFailed { codec: "zstd", msg: e.to_string() })?,
        ),
    };
    Ok(decoder)
}
