//! constants.rs
//! Crate-wide defaults shared by buffers, streams and the parallel pipeline.

/// Smallest size a full output buffer grows to (32 KiB, one deflate window).
pub const EXPAND_FLOOR: usize = 32 * 1024;

/// Blocks allowed in flight per worker when the config leaves it open.
pub const DEFAULT_INFLIGHT_PER_WORKER: usize = 2;

/// Upper bound on worker threads (sanity).
pub const MAX_WORKERS: usize = 256;

/// Fraction of available memory the dynamic profile may budget for in-flight blocks.
pub const DEFAULT_MEM_FRACTION: f64 = 0.25;
