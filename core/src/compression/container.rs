//! compression/container.rs
//! Stream headers and trailers around the raw deflate blocks.
//!
//! - gzip: 10-byte member header, CRC32 + ISIZE trailer (little-endian).
//! - zlib: 2-byte CMF/FLG header, Adler-32 trailer (big-endian).
//! - Every other codec frames itself and gets nothing here.

use crate::compression::checksum::BlockChecksum;
use crate::compression::types::CompressionCodec;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_CM_DEFLATE: u8 = 8;
const GZIP_OS_UNKNOWN: u8 = 255;

/// Deflate with a 32 KiB window.
const ZLIB_CMF: u8 = 0x78;

pub fn header(codec: CompressionCodec, level: i32) -> Vec<u8> {
    match codec {
        CompressionCodec::Gzip => {
            let xfl = match level {
                9 => 2, // maximum compression
                1 => 4, // fastest
                _ => 0,
            };
            vec![
                GZIP_MAGIC[0], GZIP_MAGIC[1], GZIP_CM_DEFLATE,
                0,          // FLG
                0, 0, 0, 0, // MTIME
                xfl,
                GZIP_OS_UNKNOWN,
            ]
        }
        CompressionCodec::Zlib => {
            let flevel: u16 = match level {
                0..=1 => 0,
                2..=5 => 1,
                6 => 2,
                _ => 3,
            };
            let mut check = (ZLIB_CMF as u16) << 8 | flevel << 6;
            check += 31 - check % 31;
            check.to_be_bytes().to_vec()
        }
        _ => Vec::new(),
    }
}

/// Trailer for a finished stream. `total_len` is the uncompressed length.
pub fn trailer(codec: CompressionCodec, checksum: Option<&BlockChecksum>, total_len: u64) -> Vec<u8> {
    let value = checksum.map(BlockChecksum::value).unwrap_or(0);
    match codec {
        CompressionCodec::Gzip => {
            let mut out = Vec::with_capacity(8);
            out.extend_from_slice(&value.to_le_bytes());
            out.extend_from_slice(&(total_len as u32).to_le_bytes()); // ISIZE is mod 2^32
            out
        }
        CompressionCodec::Zlib => value.to_be_bytes().to_vec(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_header_default_level() {
        assert_eq!(header(CompressionCodec::Zlib, 6), vec![0x78, 0x9c]);
        assert_eq!(header(CompressionCodec::Zlib, 1), vec![0x78, 0x01]);
        assert_eq!(header(CompressionCodec::Zlib, 9), vec![0x78, 0xda]);
    }

    #[test]
    fn gzip_header_shape() {
        let h = header(CompressionCodec::Gzip, 9);
        assert_eq!(h.len(), 10);
        assert_eq!(&h[..3], &[0x1f, 0x8b, 8]);
        assert_eq!(h[8], 2);
    }

    #[test]
    fn frame_codecs_have_no_container() {
        assert!(header(CompressionCodec::Zstd, 3).is_empty());
        assert!(trailer(CompressionCodec::Lz4, None, 10).is_empty());
    }
}
