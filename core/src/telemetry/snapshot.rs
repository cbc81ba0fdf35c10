//! src/telemetry/snapshot.rs
//!
//! Immutable telemetry snapshot taken when a stream finishes.
//!
//! Design notes:
//! - `compression_ratio` is total output over input; above 1.0 means the data grew.
//! - `workers` bounds how far summed stage times may exceed wall time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub blocks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub bytes_overhead: u64,
    pub compression_ratio: f64,
    pub throughput_bytes_per_sec: f64,
    pub workers: usize,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer, workers: usize) -> Self {
        let elapsed = timer.elapsed();

        let compression_ratio = if counters.bytes_in > 0 {
            counters.total_output_bytes() as f64 / counters.bytes_in as f64
        } else {
            0.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_in as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            blocks: counters.blocks,
            bytes_in: counters.bytes_in,
            bytes_out: counters.bytes_out,
            bytes_overhead: counters.bytes_overhead,
            compression_ratio,
            throughput_bytes_per_sec: throughput,
            workers: workers.max(1),
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        self.stage_times.has_all(expected)
    }

    pub fn output_bytes(&self) -> u64 {
        self.bytes_out + self.bytes_overhead
    }

    /// Internal consistency:
    /// - input was cut into at least one block
    /// - the ratio is a real number
    /// - stage time fits in wall time across workers plus reader and writer
    pub fn sanity_check(&self) -> bool {
        let threads = self.workers as u32 + 2;
        (self.bytes_in == 0 || self.blocks > 0)
            && self.compression_ratio.is_finite()
            && self.total_stage_time() <= self.elapsed * threads
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
