//! telemetry/counters.rs
//! Mutable counters used during compression streams.
//!
//! Summary: Collects block counts and byte counts while a stream runs.
//! Converted into an immutable TelemetrySnapshot at the end.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Deterministic counters collected during stream processing
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub blocks: u64,
    /// Uncompressed bytes consumed.
    pub bytes_in: u64,
    /// Compressed payload bytes produced by the codec.
    pub bytes_out: u64,
    /// Container header and trailer bytes.
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record one compressed block.
    pub fn add_block(&mut self, input_len: usize, output_len: usize) {
        self.blocks += 1;
        self.bytes_in += input_len as u64;
        self.bytes_out += output_len as u64;
    }

    /// Record container framing (header, trailer).
    pub fn add_overhead(&mut self, len: usize) {
        self.bytes_overhead += len as u64;
    }

    /// Everything written to the destination.
    pub fn total_output_bytes(&self) -> u64 {
        self.bytes_out + self.bytes_overhead
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.blocks += other.blocks;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self.bytes_overhead += other.bytes_overhead;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
