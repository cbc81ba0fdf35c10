// ## 📂 tests/test_window_buffer.rs
//
// * cursor invariant 0 <= start <= end <= capacity after every call
// * write with and without auto-expand, growth policy
// * read/consume, trim_start compaction, clear
// * release: idempotent, blocks every later operation, returns the block once
// * io::Read / io::Write adapters and stream helpers

#[cfg(test)]
mod window_buffer_tests {
    use std::io::{Cursor, Read, Write};
    use std::sync::Arc;

    use compress_core::buffer::{BlockPool, BufferError, PoolConfig, WindowBuffer};

    fn pool() -> Arc<BlockPool> {
        Arc::new(BlockPool::new())
    }

    fn assert_invariant(buf: &WindowBuffer) {
        assert!(buf.start() <= buf.end(), "{}", buf);
        assert!(buf.end() <= buf.capacity(), "{}", buf);
    }

    #[test]
    fn new_buffer_is_empty() {
        let pool = pool();
        let buf = WindowBuffer::new(&pool, 8).unwrap();
        assert_eq!(buf.capacity(), 8);
        assert_eq!((buf.start(), buf.end()), (0, 0));
        assert!(buf.is_empty());
        assert_eq!(buf.writable_len(), 8);
        assert!(!buf.is_released());
    }

    #[test]
    fn zero_capacity_leases_nothing() {
        let pool = pool();
        let buf = WindowBuffer::new(&pool, 0).unwrap();
        assert_eq!(buf.capacity(), 0);
        assert!(buf.is_full());
        assert_eq!(pool.stats().leases, 0);
    }

    // Capacity 8: write 5, read 3, then 2 remain readable at [3, 5).
    #[test]
    fn write_then_partial_read() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 8).unwrap();
        assert_eq!(buf.write(b"hello", false).unwrap(), 5);

        let mut dst = [0u8; 3];
        assert_eq!(buf.read(&mut dst).unwrap(), 3);
        assert_eq!(&dst, b"hel");
        assert_eq!((buf.start(), buf.end()), (3, 5));
        assert_eq!(buf.readable(), b"lo");
        assert_invariant(&buf);
    }

    // Capacity 8: write 5, then 4 more without expansion; only 3 fit.
    // Read 4 back, then trim the consumed prefix away.
    #[test]
    fn fill_read_and_trim() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 8).unwrap();
        assert_eq!(buf.write(&[1, 2, 3, 4, 5], false).unwrap(), 5);
        assert_eq!(buf.end(), 5);
        assert_eq!(buf.write(&[6, 7, 8, 9], false).unwrap(), 3);
        assert_eq!(buf.end(), 8);
        assert_eq!(buf.writable_len(), 0);

        let mut dst = [0u8; 4];
        assert_eq!(buf.read(&mut dst).unwrap(), 4);
        assert_eq!(dst, [1, 2, 3, 4]);
        assert_eq!(buf.start(), 4);

        buf.trim_start(4).unwrap();
        assert_eq!((buf.start(), buf.end()), (0, 0));
        assert_eq!(buf.capacity(), 8);
        assert!(buf.is_empty());
    }

    #[test]
    fn trim_after_read_keeps_unread_tail() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 8).unwrap();
        buf.write(&[1, 2, 3, 4, 5, 6, 7, 8], false).unwrap();
        let mut dst = [0u8; 4];
        buf.read(&mut dst).unwrap();

        buf.set_start(0).unwrap();
        buf.trim_start(4).unwrap();
        assert_eq!((buf.start(), buf.end()), (0, 4));
        assert_eq!(buf.readable(), &[5, 6, 7, 8]);
    }

    // Capacity 4 holding 3 bytes: a 4 byte write without expansion copies 1.
    #[test]
    fn write_without_expand_is_partial() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 4).unwrap();
        buf.write(b"abc", false).unwrap();

        assert_eq!(buf.write(b"defg", false).unwrap(), 1);
        assert_eq!(buf.readable(), b"abcd");
        assert!(buf.is_full());
        assert_eq!(buf.write(b"x", false).unwrap(), 0);
        assert_invariant(&buf);
    }

    // Capacity 4, write 6 with expansion: grows to 10 and keeps every byte.
    #[test]
    fn write_with_expand_grows() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 4).unwrap();
        assert_eq!(buf.write(b"abcdef", true).unwrap(), 6);
        assert_eq!(buf.capacity(), 10);
        assert_eq!(buf.readable(), b"abcdef");
        assert_invariant(&buf);
    }

    #[test]
    fn growth_is_at_least_half_again() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 100).unwrap();
        buf.write(&[1u8; 100], false).unwrap();
        buf.write(&[2u8; 10], true).unwrap();
        assert_eq!(buf.capacity(), 150);
        assert_eq!(buf.readable_len(), 110);
    }

    #[test]
    fn empty_buffer_grows_on_first_write() {
        let pool = pool();
        let mut buf = WindowBuffer::empty(&pool);
        assert_eq!(buf.write(b"data", true).unwrap(), 4);
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.readable(), b"data");
    }

    #[test]
    fn expand_keeps_window_offsets() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 32).unwrap();
        buf.write(&[7u8; 20], false).unwrap();
        buf.consume(5).unwrap();

        buf.expand(1000).unwrap();
        assert_eq!(buf.capacity(), 1000);
        assert_eq!((buf.start(), buf.end()), (5, 20));
        assert_eq!(buf.readable(), &[7u8; 15][..]);
    }

    #[test]
    fn expand_rejects_shrink_and_accepts_equal() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 64).unwrap();
        assert!(matches!(
            buf.expand(32),
            Err(BufferError::PreconditionViolation { what: "new_capacity", .. })
        ));
        assert_eq!(buf.capacity(), 64);

        buf.expand(64).unwrap();
        assert_eq!(buf.capacity(), 64);
        assert_eq!(pool.stats().leases, 1);
    }

    #[test]
    fn failed_expand_leaves_buffer_untouched() {
        let pool = Arc::new(BlockPool::with_config(PoolConfig {
            max_block_len: 64,
            ..PoolConfig::default()
        }));
        let mut buf = WindowBuffer::new(&pool, 64).unwrap();
        buf.write(b"keep", false).unwrap();

        assert_eq!(buf.expand(65), Err(BufferError::AllocationFailed { requested: 65 }));
        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.readable(), b"keep");
        assert_eq!(buf.write(&[0u8; 100], true), Err(BufferError::AllocationFailed { requested: 164 }));
        assert_eq!(buf.readable(), b"keep");
    }

    #[test]
    fn trim_start_compacts_to_zero() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 16).unwrap();
        buf.write(b"0123456789", false).unwrap();
        buf.consume(2).unwrap();

        buf.trim_start(3).unwrap();
        assert_eq!((buf.start(), buf.end()), (0, 5));
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.readable(), b"56789");
    }

    #[test]
    fn trim_start_bounds() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 16).unwrap();
        buf.write(b"abc", false).unwrap();
        assert!(matches!(buf.trim_start(4), Err(BufferError::PreconditionViolation { .. })));
        assert_eq!(buf.readable(), b"abc");

        buf.trim_start(0).unwrap();
        assert_eq!(pool.stats().leases, 1);
        buf.trim_start(3).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn cursor_setters_enforce_invariant() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 8).unwrap();
        buf.as_mut_slice().copy_from_slice(b"abcdefgh");

        buf.set_end(6).unwrap();
        buf.set_start(2).unwrap();
        assert_eq!(buf.readable(), b"cdef");

        assert!(buf.set_end(9).is_err());
        assert!(buf.set_end(1).is_err());
        assert!(buf.set_start(7).is_err());
        assert_eq!((buf.start(), buf.end()), (2, 6));
    }

    #[test]
    fn commit_after_direct_write() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 8).unwrap();
        buf.writable_mut()[..3].copy_from_slice(b"xyz");
        buf.commit(3).unwrap();
        assert_eq!(buf.readable(), b"xyz");
        assert!(buf.commit(6).is_err());
        assert!(buf.consume(4).is_err());
    }

    #[test]
    fn clear_resets_cursors_only() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 8).unwrap();
        buf.write(b"abcd", false).unwrap();
        buf.clear().unwrap();
        assert_eq!((buf.start(), buf.end(), buf.capacity()), (0, 0, 8));
        assert_eq!(&buf.as_slice()[..4], b"abcd");
    }

    #[test]
    fn release_is_idempotent_and_final() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 64).unwrap();
        buf.write(b"abc", false).unwrap();

        buf.release();
        buf.release();
        assert!(buf.is_released());
        assert_eq!(buf.capacity(), 0);
        assert_eq!(pool.stats().reclaims, 1);

        let mut dst = [0u8; 4];
        assert_eq!(buf.read(&mut dst), Err(BufferError::UseAfterRelease));
        assert_eq!(buf.write(b"", false), Err(BufferError::UseAfterRelease));
        assert_eq!(buf.write(b"x", true), Err(BufferError::UseAfterRelease));
        assert_eq!(buf.expand(128), Err(BufferError::UseAfterRelease));
        assert_eq!(buf.trim_start(0), Err(BufferError::UseAfterRelease));
        assert_eq!(buf.clear(), Err(BufferError::UseAfterRelease));
        assert_eq!(buf.set_start(0), Err(BufferError::UseAfterRelease));

        drop(buf);
        assert_eq!(pool.stats().reclaims, 1);
    }

    #[test]
    fn drop_returns_block() {
        let pool = pool();
        {
            let _buf = WindowBuffer::new(&pool, 100).unwrap();
            assert_eq!(pool.stats().outstanding_bytes, 128);
        }
        let stats = pool.stats();
        assert_eq!(stats.outstanding_bytes, 0);
        assert_eq!(stats.retained_bytes, 128);
    }

    #[test]
    fn io_adapters() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 2).unwrap();
        buf.write_all(b"grows past two bytes").unwrap();

        let mut out = String::new();
        buf.read_to_string(&mut out).unwrap();
        assert_eq!(out, "grows past two bytes");
        assert!(buf.is_empty());
    }

    #[test]
    fn io_error_carries_buffer_error() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 8).unwrap();
        buf.release();
        let err = buf.write_all(b"x").unwrap_err();
        assert_eq!(BufferError::from_io(&err), Some(BufferError::UseAfterRelease));
    }

    #[test]
    fn fill_from_and_drain_to() {
        let pool = pool();
        let mut buf = WindowBuffer::new(&pool, 4).unwrap();
        let mut src = Cursor::new(b"abcdef".to_vec());

        assert_eq!(buf.fill_from(&mut src).unwrap(), 4);
        assert!(buf.is_full());

        let mut sink = Vec::new();
        assert_eq!(buf.drain_to(&mut sink).unwrap(), 4);
        assert!(buf.is_empty());

        assert_eq!(buf.fill_from(&mut src).unwrap(), 2);
        buf.drain_to(&mut sink).unwrap();
        assert_eq!(buf.fill_from(&mut src).unwrap(), 0);
        assert_eq!(sink, b"abcdef");
    }
}
