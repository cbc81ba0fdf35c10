//! parallel/worker.rs
//! Compression worker: input block in, shared output buffer out.
//!
//! Design notes:
//! - Each worker owns its compressor; nothing codec-related is shared.
//! - A job's dictionary reference is released right after priming; the input
//!   reference right after compressing. Whichever of the two jobs sharing a
//!   buffer finishes last returns it to the pool.
//! - Handoff follows the shared-buffer protocol: take a reference for the
//!   writer, then release the worker's own.
//! - After an error, or once the writer is gone, the worker stops pulling jobs.

use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::{Receiver, Sender};
use log::{debug, warn};

use crate::buffer::{BufferPool, SharedWindowBuffer};
use crate::compression::{prime_from, BlockChecksum, BlockCompressor, CompressionCodec, CompressionError};
use crate::parallel::job::{CompressJob, CompressedBlock};
use crate::utils::compress_bound_hint;

pub struct CompressWorker<P: BufferPool> {
    id: usize,
    codec: CompressionCodec,
    compressor: Box<dyn BlockCompressor<P>>,
    pool: Arc<P>,
}

impl<P: BufferPool> CompressWorker<P> {
    pub fn new(id: usize, compressor: Box<dyn BlockCompressor<P>>, pool: Arc<P>) -> Self {
        Self {
            id,
            codec: compressor.codec(),
            compressor,
            pool,
        }
    }

    pub fn run(
        mut self,
        rx: Receiver<CompressJob<P>>,
        tx: Sender<Result<CompressedBlock<P>, CompressionError>>,
    ) {
        debug!("[WORKER-{}] starting", self.id);
        while let Ok(job) = rx.recv() {
            let seq = job.seq;
            let result = self.process(job);
            let failed = result.is_err();

            if tx.send(result).is_err() {
                debug!("[WORKER-{}] writer gone, exiting", self.id);
                return;
            }
            if failed {
                warn!("[WORKER-{}] block {} failed, exiting", self.id, seq);
                return;
            }
        }
        debug!("[WORKER-{}] input closed, exiting", self.id);
    }

    /// Compress one job into a fresh pooled buffer.
    pub fn process(&mut self, job: CompressJob<P>) -> Result<CompressedBlock<P>, CompressionError> {
        let started = Instant::now();
        let CompressJob { seq, flags, input, dictionary } = job;

        if let Some(dict) = dictionary {
            prime_from(&mut *self.compressor, dict)?;
        }

        let output = SharedWindowBuffer::new(&self.pool, compress_bound_hint(input.readable_len()))?;
        let (input_len, checksum) = {
            // Shared read: the next block's worker may be priming from these bytes.
            let src = input.view();
            let mut out = output.lock();
            self.compressor.compress_block(src.readable(), &mut *out, flags)?;
            let checksum = BlockChecksum::for_codec(self.codec).map(|mut sum| {
                sum.update(src.readable());
                sum
            });
            (src.readable_len(), checksum)
        };
        input.release_ref();

        let handoff = output.acquire_ref();
        output.release_ref();

        Ok(CompressedBlock {
            seq,
            flags,
            input_len,
            output: handoff,
            checksum,
            compress_time: started.elapsed(),
        })
    }
}
