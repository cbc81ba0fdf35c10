//! compression/checksum.rs
//! Container checksums computed per block and stitched together in order.
//!
//! Design notes:
//! - Workers checksum their own block; the writer combines them in sequence,
//!   so no thread ever rescans the whole stream.
//! - CRC32 comes from `crc32fast` (it already knows how to combine).
//! - Adler-32 is small enough to carry here, combine formula as in zlib.

use crc32fast::Hasher;

use crate::compression::types::CompressionCodec;

const ADLER_BASE: u64 = 65521;
/// Largest run before the Adler sums must be reduced (zlib's NMAX).
const ADLER_NMAX: usize = 5552;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adler32 {
    a: u32,
    b: u32,
    len: u64,
}

impl Default for Adler32 {
    fn default() -> Self {
        Self { a: 1, b: 0, len: 0 }
    }
}

impl Adler32 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut a = self.a as u64;
        let mut b = self.b as u64;
        for chunk in data.chunks(ADLER_NMAX) {
            for &byte in chunk {
                a += byte as u64;
                b += a;
            }
            a %= ADLER_BASE;
            b %= ADLER_BASE;
        }
        self.a = a as u32;
        self.b = b as u32;
        self.len += data.len() as u64;
    }

    /// Append `other`, which must cover the bytes right after ours.
    pub fn combine(&mut self, other: &Adler32) {
        let rem = other.len % ADLER_BASE;
        let a1 = self.a as u64;
        let b1 = self.b as u64;
        let a2 = other.a as u64;
        let b2 = other.b as u64;

        let a = (a1 + a2 + ADLER_BASE - 1) % ADLER_BASE;
        let b = (rem * a1 % ADLER_BASE + b1 + b2 + ADLER_BASE - rem) % ADLER_BASE;

        self.a = a as u32;
        self.b = b as u32;
        self.len += other.len;
    }

    pub fn value(&self) -> u32 {
        (self.b << 16) | self.a
    }
}

/// Running checksum for one block or a whole stream.
#[derive(Debug, Clone)]
pub enum BlockChecksum {
    Crc32(Hasher),
    Adler32(Adler32),
}

impl BlockChecksum {
    /// The checksum a codec's container trailer carries, if any.
    pub fn for_codec(codec: CompressionCodec) -> Option<Self> {
        match codec {
            CompressionCodec::Gzip => Some(BlockChecksum::Crc32(Hasher::new())),
            CompressionCodec::Zlib => Some(BlockChecksum::Adler32(Adler32::new())),
            _ => None,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            BlockChecksum::Crc32(h) => h.update(data),
            BlockChecksum::Adler32(a) => a.update(data),
        }
    }

    /// Append a checksum covering the bytes right after ours.
    /// Mismatched kinds are ignored; a stream only ever carries one kind.
    pub fn combine(&mut self, next: &BlockChecksum) {
        match (self, next) {
            (BlockChecksum::Crc32(h), BlockChecksum::Crc32(n)) => h.combine(n),
            (BlockChecksum::Adler32(a), BlockChecksum::Adler32(n)) => a.combine(n),
            _ => {}
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            BlockChecksum::Crc32(h) => h.clone().finalize(),
            BlockChecksum::Adler32(a) => a.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adler_known_value() {
        let mut a = Adler32::new();
        a.update(b"Wikipedia");
        assert_eq!(a.value(), 0x11E6_0398);
    }

    #[test]
    fn adler_combine_matches_whole() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i * 31 % 251) as u8).collect();
        let (left, right) = data.split_at(7_777);

        let mut whole = Adler32::new();
        whole.update(&data);

        let mut l = Adler32::new();
        l.update(left);
        let mut r = Adler32::new();
        r.update(right);
        l.combine(&r);

        assert_eq!(l.value(), whole.value());
    }

    #[test]
    fn crc_combine_matches_whole() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut whole = BlockChecksum::for_codec(CompressionCodec::Gzip).unwrap();
        whole.update(data);

        let mut first = BlockChecksum::for_codec(CompressionCodec::Gzip).unwrap();
        first.update(&data[..10]);
        let mut second = BlockChecksum::for_codec(CompressionCodec::Gzip).unwrap();
        second.update(&data[10..]);
        first.combine(&second);

        assert_eq!(first.value(), whole.value());
        assert_eq!(whole.value(), crc32fast::hash(data));
    }
}
