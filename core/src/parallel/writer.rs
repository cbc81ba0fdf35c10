//! parallel/writer.rs
//! Re-sequences compressed blocks and writes them out in order.
//!
//! Blocks arrive in completion order. Each one waits in `pending` until every
//! block before it has been written; once written, the writer releases its
//! reference and the buffer returns to the pool.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::Instant;

use log::{debug, trace};

use crate::buffer::BufferPool;
use crate::compression::{container, BlockChecksum, CompressionCodec};
use crate::parallel::job::CompressedBlock;
use crate::telemetry::{Stage, StageTimes, TelemetryCounters};
use crate::types::StreamError;

pub struct OrderedBlockWriter<'a, W: Write, P: BufferPool> {
    out: &'a mut W,
    codec: CompressionCodec,
    next: u64,
    pending: BTreeMap<u64, CompressedBlock<P>>,
    checksum: Option<BlockChecksum>,
    saw_last: bool,
    counters: TelemetryCounters,
    stage_times: StageTimes,
}

impl<'a, W: Write, P: BufferPool> OrderedBlockWriter<'a, W, P> {
    pub fn new(out: &'a mut W, codec: CompressionCodec) -> Self {
        Self {
            out,
            codec,
            next: 0,
            pending: BTreeMap::new(),
            checksum: BlockChecksum::for_codec(codec),
            saw_last: false,
            counters: TelemetryCounters::default(),
            stage_times: StageTimes::default(),
        }
    }

    /// Blocks received but not yet written.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn push(&mut self, block: CompressedBlock<P>) -> Result<(), StreamError> {
        if block.seq < self.next || self.pending.contains_key(&block.seq) {
            return Err(StreamError::PipelineError("duplicate block sequence"));
        }
        trace!("[WRITER] queuing block {}", block.seq);
        self.pending.insert(block.seq, block);
        self.flush_ready()
    }

    /// Write the trailer once the last block is out. Returns what was written
    /// (block payloads and trailer) and the stage times collected on the way.
    pub fn finish(mut self) -> Result<(TelemetryCounters, StageTimes), StreamError> {
        self.flush_ready()?;
        if !self.pending.is_empty() {
            return Err(StreamError::PipelineError("blocks missing before end of stream"));
        }
        if !self.saw_last {
            return Err(StreamError::PipelineError("stream ended without a final block"));
        }

        let trailer = container::trailer(self.codec, self.checksum.as_ref(), self.counters.bytes_in);
        let t = Instant::now();
        self.out.write_all(&trailer)?;
        self.out.flush()?;
        self.stage_times.add(Stage::Write, t.elapsed());
        self.counters.add_overhead(trailer.len());

        debug!("[WRITER] finished after {} blocks", self.counters.blocks);
        Ok((self.counters, self.stage_times))
    }

    fn flush_ready(&mut self) -> Result<(), StreamError> {
        while let Some(block) = self.pending.remove(&self.next) {
            self.write(block)?;
            self.next += 1;
        }
        Ok(())
    }

    fn write(&mut self, block: CompressedBlock<P>) -> Result<(), StreamError> {
        if self.saw_last {
            return Err(StreamError::PipelineError("block after final block"));
        }

        let t = Instant::now();
        let out = &mut *self.out;
        block.output.with_readable(|bytes| out.write_all(bytes))?;
        self.stage_times.add(Stage::Write, t.elapsed());
        self.stage_times.add(Stage::Compress, block.compress_time);

        if let (Some(total), Some(part)) = (self.checksum.as_mut(), block.checksum.as_ref()) {
            total.combine(part);
        }
        self.counters.add_block(block.input_len, block.output_len());
        if block.is_last() {
            self.saw_last = true;
        }
        trace!("[WRITER] wrote block {} ({} bytes)", block.seq, block.output_len());

        block.output.release_ref();
        Ok(())
    }
}
