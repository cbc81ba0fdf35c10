// ## 📂 tests/test_stream.rs
//
// * compress_stream -> decompress_stream round trip for every codec
// * boundary sizes: empty, one byte, exact block, block + 1
// * standard decoders read our gzip/zlib output
// * telemetry counters match what was written
// * pool leases all come back, including on failure

#[cfg(test)]
mod stream_tests {
    use std::io::{self, Cursor, Read, Write};
    use std::sync::Arc;

    use compress_core::buffer::{BlockPool, BufferError, PoolConfig};
    use compress_core::compression::{compress_stream, decompress_stream, CodecOptions, CompressionCodec, CompressionError};

    const ALL: [CompressionCodec; 6] = [
        CompressionCodec::Deflate,
        CompressionCodec::Zlib,
        CompressionCodec::Gzip,
        CompressionCodec::Xz,
        CompressionCodec::Lz4,
        CompressionCodec::Zstd,
    ];
    const BLOCK: usize = 4096;

    fn sample(len: usize) -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog. "
            .iter()
            .cycle()
            .zip(0..len)
            .map(|(b, i)| b.wrapping_add((i / 700) as u8))
            .collect()
    }

    fn roundtrip(codec: CompressionCodec, data: &[u8], pool: &Arc<BlockPool>) -> Vec<u8> {
        let opts = CodecOptions::new(codec).with_block_size(BLOCK);
        let mut compressed = Vec::new();
        let snap = compress_stream(Cursor::new(data), &mut compressed, &opts, pool).unwrap();
        assert_eq!(snap.bytes_in, data.len() as u64);
        assert_eq!(snap.output_bytes(), compressed.len() as u64);
        assert!(snap.sanity_check());

        let mut plain = Vec::new();
        let back = decompress_stream(&compressed[..], &mut plain, codec, pool, Some(1024)).unwrap();
        assert_eq!(back.bytes_in, compressed.len() as u64);
        assert_eq!(back.bytes_out, plain.len() as u64);
        plain
    }

    #[test]
    fn roundtrip_all_codecs_and_sizes() {
        let pool = Arc::new(BlockPool::new());
        for codec in ALL {
            for len in [0, 1, BLOCK - 1, BLOCK, BLOCK + 1, 5 * BLOCK + 17] {
                let data = sample(len);
                assert_eq!(roundtrip(codec, &data, &pool), data, "codec {} len {}", codec, len);
            }
        }
        let stats = pool.stats();
        assert_eq!(stats.leases, stats.reclaims);
        assert_eq!(stats.outstanding_bytes, 0);
    }

    #[test]
    fn block_count_follows_block_size() {
        let pool = Arc::new(BlockPool::new());
        let opts = CodecOptions::new(CompressionCodec::Zstd).with_block_size(BLOCK);
        let mut sink = Vec::new();

        let snap = compress_stream(Cursor::new(sample(3 * BLOCK)), &mut sink, &opts, &pool).unwrap();
        assert_eq!(snap.blocks, 3);

        sink.clear();
        let snap = compress_stream(Cursor::new(sample(3 * BLOCK + 1)), &mut sink, &opts, &pool).unwrap();
        assert_eq!(snap.blocks, 4);

        sink.clear();
        let snap = compress_stream(io::empty(), &mut sink, &opts, &pool).unwrap();
        assert_eq!(snap.blocks, 1);
    }

    #[test]
    fn standard_decoders_accept_output() {
        let pool = Arc::new(BlockPool::new());
        let data = sample(10 * BLOCK + 3);

        let mut gz = Vec::new();
        let opts = CodecOptions::new(CompressionCodec::Gzip).with_block_size(BLOCK);
        let snap = compress_stream(Cursor::new(&data), &mut gz, &opts, &pool).unwrap();
        assert_eq!(snap.bytes_overhead, 18);
        let mut plain = Vec::new();
        flate2::read::GzDecoder::new(&gz[..]).read_to_end(&mut plain).unwrap();
        assert_eq!(plain, data);

        let mut zl = Vec::new();
        let opts = CodecOptions::new(CompressionCodec::Zlib).with_level(9).with_block_size(BLOCK);
        compress_stream(Cursor::new(&data), &mut zl, &opts, &pool).unwrap();
        assert_eq!(&zl[..2], &[0x78, 0xda]);
        let mut plain = Vec::new();
        flate2::read::ZlibDecoder::new(&zl[..]).read_to_end(&mut plain).unwrap();
        assert_eq!(plain, data);

        let mut zs = Vec::new();
        let opts = CodecOptions::new(CompressionCodec::Zstd).with_block_size(BLOCK);
        compress_stream(Cursor::new(&data), &mut zs, &opts, &pool).unwrap();
        assert_eq!(zstd::stream::decode_all(&zs[..]).unwrap(), data);
    }

    #[test]
    fn invalid_options_fail_before_io() {
        let pool = Arc::new(BlockPool::new());
        let opts = CodecOptions::new(CompressionCodec::Lz4).with_level(99);
        let mut sink = Vec::new();
        let err = compress_stream(Cursor::new(b"abc"), &mut sink, &opts, &pool).unwrap_err();
        assert!(matches!(err, CompressionError::InvalidLevel { level: 99, .. }));
        assert!(sink.is_empty());

        let err = decompress_stream(&b""[..], &mut sink, CompressionCodec::Gzip, &pool, Some(0)).unwrap_err();
        assert!(matches!(err, CompressionError::InvalidBlockSize { have: 0, .. }));
    }

    #[test]
    fn pool_exhaustion_surfaces_as_buffer_error() {
        let pool = Arc::new(BlockPool::with_config(PoolConfig {
            max_outstanding_bytes: Some(2 * BLOCK),
            ..PoolConfig::default()
        }));
        let opts = CodecOptions::new(CompressionCodec::Deflate).with_block_size(BLOCK);
        let mut sink = Vec::new();
        let err = compress_stream(Cursor::new(sample(BLOCK)), &mut sink, &opts, &pool).unwrap_err();
        assert!(matches!(err, CompressionError::Buffer(BufferError::AllocationFailed { .. })));
        assert_eq!(pool.stats().outstanding_bytes, 0);
    }

    #[test]
    fn corrupt_input_fails_decompression() {
        let pool = Arc::new(BlockPool::new());
        let garbage = vec![0xA5u8; 300];
        let mut sink = Vec::new();
        let err = decompress_stream(&garbage[..], &mut sink, CompressionCodec::Zstd, &pool, None).unwrap_err();
        assert!(matches!(
            err,
            CompressionError::CodecProcessFailed { codec: "zstd", .. } | CompressionError::CodecInitFailed { .. }
        ));
        assert_eq!(pool.stats().outstanding_bytes, 0);
    }

    fn noise(len: usize) -> Vec<u8> {
        let mut x = 0x2545_f491u32;
        (0..len)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                x as u8
            })
            .collect()
    }

    // Incompressible blocks make lz4 frames larger than the staging buffer,
    // so frame boundaries land mid-read.
    #[test]
    fn lz4_frames_decode_through_small_staging_buffer() {
        let pool = Arc::new(BlockPool::new());
        let data = noise(20_000);
        let opts = CodecOptions::new(CompressionCodec::Lz4).with_block_size(BLOCK);
        let mut compressed = Vec::new();
        compress_stream(Cursor::new(&data), &mut compressed, &opts, &pool).unwrap();

        for staging in [1, 1000, BLOCK - 1, BLOCK + 1, 64 * 1024] {
            let mut plain = Vec::new();
            decompress_stream(&compressed[..], &mut plain, CompressionCodec::Lz4, &pool, Some(staging)).unwrap();
            assert_eq!(plain, data, "staging {}", staging);
        }
        assert_eq!(pool.stats().outstanding_bytes, 0);
    }

    #[test]
    fn truncated_lz4_stream_is_an_error() {
        let pool = Arc::new(BlockPool::new());
        let data = sample(200_000);
        let opts = CodecOptions::new(CompressionCodec::Lz4).with_block_size(64 * 1024);
        let mut compressed = Vec::new();
        compress_stream(Cursor::new(&data), &mut compressed, &opts, &pool).unwrap();
        compressed.truncate(compressed.len() / 2);

        let mut plain = Vec::new();
        let err = decompress_stream(&compressed[..], &mut plain, CompressionCodec::Lz4, &pool, None).unwrap_err();
        assert!(matches!(err, CompressionError::CodecProcessFailed { codec: "lz4", .. }), "{:?}", err);
        assert!(plain.len() < data.len());
        assert_eq!(pool.stats().outstanding_bytes, 0);
    }

    /// Accepts a few bytes, then fails every write.
    struct FailingWriter {
        budget: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_failure_is_reported_and_buffers_return() {
        let pool = Arc::new(BlockPool::new());
        let opts = CodecOptions::new(CompressionCodec::Lz4).with_block_size(BLOCK);
        let err = compress_stream(Cursor::new(sample(8 * BLOCK)), FailingWriter { budget: 10 }, &opts, &pool)
            .unwrap_err();
        match err {
            CompressionError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected error: {}", other),
        }
        let stats = pool.stats();
        assert_eq!(stats.leases, stats.reclaims);
    }
}
