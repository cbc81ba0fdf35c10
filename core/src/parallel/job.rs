//! parallel/job.rs
//! Units of work moving through the compression pipeline.

use std::time::Duration;

use crate::buffer::{BlockPool, BufferPool, SharedWindowBuffer};
use crate::compression::{BlockChecksum, BlockFlags};

/// One input block on its way to a worker.
///
/// `input` may also be referenced as the next block's dictionary, so the block
/// returns to the pool once both jobs are done with it.
pub struct CompressJob<P: BufferPool = BlockPool> {
    pub seq: u64,
    pub flags: BlockFlags,
    pub input: SharedWindowBuffer<P>,
    /// History to prime the compressor with; released once primed.
    pub dictionary: Option<SharedWindowBuffer<P>>,
}

/// One compressed block on its way to the ordered writer.
///
/// `output` is the writer's reference to the worker's buffer; the writer
/// releases it once the bytes are flushed.
pub struct CompressedBlock<P: BufferPool = BlockPool> {
    pub seq: u64,
    pub flags: BlockFlags,
    pub input_len: usize,
    pub output: SharedWindowBuffer<P>,
    /// Checksum of this block's input, when the container needs one.
    pub checksum: Option<BlockChecksum>,
    pub compress_time: Duration,
}

impl<P: BufferPool> CompressedBlock<P> {
    pub fn output_len(&self) -> usize {
        self.output.readable_len()
    }

    pub fn is_last(&self) -> bool {
        self.flags.contains(BlockFlags::LAST)
    }
}
