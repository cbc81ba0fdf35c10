//! compression/codecs/mod.rs
//! Block compressors, one per codec family.

pub mod deflate;
pub mod lz4;
pub mod xz;
pub mod zstd;

pub use self::deflate::*;
pub use self::lz4::*;
pub use self::xz::*;
pub use self::zstd::*;
