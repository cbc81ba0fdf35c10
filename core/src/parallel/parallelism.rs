//! parallel/parallelism.rs
//! Worker and in-flight sizing for the compression pipeline.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_INFLIGHT_PER_WORKER, MAX_WORKERS};

/// Parallelism configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelismProfile {
    pub workers: usize,
    pub inflight_blocks: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self {
            workers: 1,
            inflight_blocks: 1,
        }
    }

    pub fn with_workers(workers: usize) -> Self {
        let workers = workers.clamp(1, MAX_WORKERS);
        Self {
            workers,
            inflight_blocks: workers * DEFAULT_INFLIGHT_PER_WORKER,
        }
    }

    /// Size from the machine: one worker per core but one, and as many blocks in
    /// flight as `mem_fraction` of available memory holds (input plus output per
    /// block), capped at `hard_cap`.
    pub fn dynamic(block_size: usize, mem_fraction: f64, hard_cap: usize) -> Self {
        let cores = num_cpus::get();
        let workers = cores.saturating_sub(1).clamp(1, MAX_WORKERS); // leave one core free

        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        let avail_bytes = sys.available_memory();

        // Budget = fraction of available memory
        let budget = (avail_bytes as f64 * mem_fraction.clamp(0.0, 1.0)) as u64;
        let per_block = (block_size.max(1) as u64).saturating_mul(2);
        let max_blocks = (budget / per_block) as usize;

        let profile = Self {
            workers,
            inflight_blocks: max_blocks.clamp(1, hard_cap.max(1)),
        };
        debug!(
            "[PROFILE] workers={}, inflight_blocks={}, available_memory={}",
            profile.workers, profile.inflight_blocks, avail_bytes
        );
        profile
    }
}
