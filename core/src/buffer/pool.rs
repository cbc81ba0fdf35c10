//! buffer/pool.rs
//! Capacity-keyed block pool backing every window buffer.
//!
//! Design notes:
//! - `BufferPool` is the seam: buffers only ever `lease` and `reclaim` through it.
//! - `BlockPool` keeps free blocks in power-of-two size classes behind one short lock.
//! - A lease reuses the smallest retained block within 2x of the request, otherwise allocates.
//! - Allocation goes through `try_reserve_exact`, so real memory pressure becomes
//!   `AllocationFailed` instead of an abort.
//! - Counters are relaxed atomics; `stats()` is a point-in-time snapshot, not a transaction.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::buffer::types::BufferError;

/// Smallest block the pool hands out.
pub const MIN_BLOCK_LEN: usize = 16;

/// Largest single block a default pool will allocate (1 GiB).
pub const DEFAULT_MAX_BLOCK_LEN: usize = 1 << 30;

/// Free blocks retained per size class before extra returns are dropped.
pub const DEFAULT_MAX_RETAINED_PER_CLASS: usize = 32;

/// Lending pool for byte blocks.
///
/// - `lease` returns a block whose `len()` is at least `min_len`.
/// - `reclaim` accepts any block, whatever its size or origin.
/// - Both must be safe to call from any thread and must not block for long.
pub trait BufferPool: Send + Sync {
    fn lease(&self, min_len: usize) -> Result<Vec<u8>, BufferError>;
    fn reclaim(&self, block: Vec<u8>);
}

// ============================================================
// Configuration
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Requests above this size fail with `AllocationFailed`.
    pub max_block_len: usize,
    /// Upper bound on bytes leased and not yet reclaimed. `None` means unbounded.
    pub max_outstanding_bytes: Option<usize>,
    pub max_retained_per_class: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_block_len: DEFAULT_MAX_BLOCK_LEN,
            max_outstanding_bytes: None,
            max_retained_per_class: DEFAULT_MAX_RETAINED_PER_CLASS,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.max_block_len < MIN_BLOCK_LEN {
            return Err(BufferError::out_of_range(
                "max_block_len",
                self.max_block_len,
                MIN_BLOCK_LEN,
                usize::MAX,
            ));
        }
        Ok(())
    }
}

// ============================================================
// Statistics
// ============================================================

/// Snapshot of pool activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub leases: u64,
    pub reclaims: u64,
    /// Leases that had to allocate fresh memory.
    pub allocations: u64,
    pub failed_leases: u64,
    pub outstanding_bytes: usize,
    pub retained_bytes: usize,
}

#[derive(Default)]
struct PoolMetrics {
    leases: AtomicU64,
    reclaims: AtomicU64,
    allocations: AtomicU64,
    failed_leases: AtomicU64,
    outstanding_bytes: AtomicUsize,
    retained_bytes: AtomicUsize,
}

impl PoolMetrics {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            leases: self.leases.load(Ordering::Relaxed),
            reclaims: self.reclaims.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            failed_leases: self.failed_leases.load(Ordering::Relaxed),
            outstanding_bytes: self.outstanding_bytes.load(Ordering::Relaxed),
            retained_bytes: self.retained_bytes.load(Ordering::Relaxed),
        }
    }

    /// Charge `len` against the outstanding budget; fails without charging.
    fn charge(&self, len: usize, limit: Option<usize>) -> bool {
        match limit {
            None => {
                self.outstanding_bytes.fetch_add(len, Ordering::Relaxed);
                true
            }
            Some(limit) => self
                .outstanding_bytes
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                    cur.checked_add(len).filter(|next| *next <= limit)
                })
                .is_ok(),
        }
    }

    fn discharge(&self, len: usize) {
        let _ = self
            .outstanding_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                Some(cur.saturating_sub(len))
            });
    }
}

// ============================================================
// BlockPool
// ============================================================

/// Default `BufferPool`: size-classed free lists plus atomic metrics.
pub struct BlockPool {
    config: PoolConfig,
    free: Mutex<BTreeMap<usize, Vec<Vec<u8>>>>,
    metrics: PoolMetrics,
}

impl Default for BlockPool {
    fn default() -> Self {
        Self::with_config(PoolConfig::default())
    }
}

impl std::fmt::Debug for BlockPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl BlockPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            free: Mutex::new(BTreeMap::new()),
            metrics: PoolMetrics::default(),
        }
    }

    /// Process-wide pool shared by callers that do not bring their own.
    pub fn shared() -> Arc<BlockPool> {
        static SHARED: OnceLock<Arc<BlockPool>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(BlockPool::default())).clone()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn stats(&self) -> PoolStats {
        self.metrics.snapshot()
    }

    /// Drop every retained free block.
    pub fn shrink(&self) {
        let drained = std::mem::take(&mut *self.free.lock());
        let bytes: usize = drained
            .iter()
            .map(|(len, blocks)| len.saturating_mul(blocks.len()))
            .sum();
        self.metrics.retained_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }

    /// Size class for a request; never below `MIN_BLOCK_LEN`, never above the configured cap.
    fn size_class(&self, min_len: usize) -> usize {
        min_len
            .max(MIN_BLOCK_LEN)
            .checked_next_power_of_two()
            .unwrap_or(usize::MAX)
            .min(self.config.max_block_len)
            .max(min_len)
    }

    fn take_free(&self, min_len: usize, class: usize) -> Option<Vec<u8>> {
        let mut free = self.free.lock();
        let key = free
            .range(min_len..=class.saturating_mul(2))
            .find(|(_, blocks)| !blocks.is_empty())
            .map(|(len, _)| *len)?;
        let blocks = free.get_mut(&key)?;
        let block = blocks.pop();
        if blocks.is_empty() {
            free.remove(&key);
        }
        block
    }

    fn fail(&self, requested: usize) -> BufferError {
        self.metrics.failed_leases.fetch_add(1, Ordering::Relaxed);
        BufferError::AllocationFailed { requested }
    }
}

impl BufferPool for BlockPool {
    fn lease(&self, min_len: usize) -> Result<Vec<u8>, BufferError> {
        if min_len > self.config.max_block_len {
            return Err(self.fail(min_len));
        }
        let class = self.size_class(min_len);

        if let Some(block) = self.take_free(min_len, class) {
            let len = block.len();
            if !self.metrics.charge(len, self.config.max_outstanding_bytes) {
                // Put it back untouched; the budget, not the free list, refused.
                self.free.lock().entry(len).or_default().push(block);
                return Err(self.fail(min_len));
            }
            self.metrics.retained_bytes.fetch_sub(len, Ordering::Relaxed);
            self.metrics.leases.fetch_add(1, Ordering::Relaxed);
            return Ok(block);
        }

        if !self.metrics.charge(class, self.config.max_outstanding_bytes) {
            return Err(self.fail(min_len));
        }
        let mut block = Vec::new();
        if block.try_reserve_exact(class).is_err() {
            self.metrics.discharge(class);
            return Err(self.fail(min_len));
        }
        block.resize(class, 0);

        self.metrics.allocations.fetch_add(1, Ordering::Relaxed);
        self.metrics.leases.fetch_add(1, Ordering::Relaxed);
        Ok(block)
    }

    fn reclaim(&self, block: Vec<u8>) {
        let len = block.len();
        self.metrics.reclaims.fetch_add(1, Ordering::Relaxed);
        self.metrics.discharge(len);

        if len < MIN_BLOCK_LEN || len > self.config.max_block_len {
            return;
        }
        let mut free = self.free.lock();
        let bucket = free.entry(len).or_default();
        if bucket.len() < self.config.max_retained_per_class {
            bucket.push(block);
            self.metrics.retained_bytes.fetch_add(len, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_rounds_to_size_class() {
        let pool = BlockPool::new();
        assert_eq!(pool.lease(1).unwrap().len(), MIN_BLOCK_LEN);
        assert_eq!(pool.lease(100).unwrap().len(), 128);
        assert_eq!(pool.lease(128).unwrap().len(), 128);
    }

    #[test]
    fn size_class_respects_cap() {
        let pool = BlockPool::with_config(PoolConfig {
            max_block_len: 1000,
            ..PoolConfig::default()
        });
        assert_eq!(pool.lease(600).unwrap().len(), 1000);
        assert!(pool.lease(1001).is_err());
    }

    #[test]
    fn reclaimed_block_is_reused() {
        let pool = BlockPool::new();
        let block = pool.lease(64).unwrap();
        pool.reclaim(block);
        assert_eq!(pool.stats().retained_bytes, 64);

        let again = pool.lease(40).unwrap();
        assert_eq!(again.len(), 64);
        let stats = pool.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.leases, 2);
        assert_eq!(stats.retained_bytes, 0);
        assert_eq!(stats.outstanding_bytes, 64);
    }

    #[test]
    fn shrink_drops_retained() {
        let pool = BlockPool::new();
        pool.reclaim(vec![0u8; 256]);
        pool.reclaim(vec![0u8; 32]);
        assert_eq!(pool.stats().retained_bytes, 288);
        pool.shrink();
        assert_eq!(pool.stats().retained_bytes, 0);
    }
}
