//! parallel/pipeline.rs
//! Multi-threaded block compression: reader -> N workers -> ordered writer.
//!
//! Design notes:
//! - Bounded channels cap the blocks in flight, and with them pool usage.
//! - The reader reads one block ahead so it can flag the last block.
//! - For deflate the reader also hands each job a reference to the previous
//!   32 KiB of input, usually the previous job's own input buffer.
//! - The caller's thread runs the ordered writer; `W` never crosses threads.
//! - On any failure the failing stage drops its channel ends, the rest of the
//!   pipeline drains out, every thread is joined, and the first real error is
//!   returned. Buffers still in flight go back to the pool when they drop.
//! - For a given block size the output is identical to `compress_stream` and
//!   does not depend on the worker count.

use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, Sender};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::buffer::{BufferPool, SharedWindowBuffer, WindowBuffer};
use crate::compression::{
    container, create_compressor, BlockCompressor, BlockFlags, CodecOptions, CompressionCodec, CompressionError,
    DictionaryChain,
};
use crate::constants::{DEFAULT_INFLIGHT_PER_WORKER, MAX_WORKERS};
use crate::parallel::job::{CompressJob, CompressedBlock};
use crate::parallel::parallelism::ParallelismProfile;
use crate::parallel::worker::CompressWorker;
use crate::parallel::writer::OrderedBlockWriter;
use crate::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

/// Reported by the reader when the workers went away first.
const JOB_CHANNEL_CLOSED: &str = "job channel closed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    pub codec: CodecOptions,
    /// Worker threads; 0 means one per core.
    pub workers: usize,
    /// Blocks queued between stages; 0 means two per worker.
    pub inflight_blocks: usize,
}

impl ParallelConfig {
    pub fn new(codec: CodecOptions) -> Self {
        Self { codec, workers: 0, inflight_blocks: 0 }
    }

    pub fn with_profile(codec: CodecOptions, profile: &ParallelismProfile) -> Self {
        Self {
            codec,
            workers: profile.workers,
            inflight_blocks: profile.inflight_blocks,
        }
    }

    pub fn worker_count(&self) -> usize {
        match self.workers {
            0 => num_cpus::get().clamp(1, MAX_WORKERS),
            n => n,
        }
    }

    pub fn inflight(&self) -> usize {
        match self.inflight_blocks {
            0 => self.worker_count() * DEFAULT_INFLIGHT_PER_WORKER,
            n => n,
        }
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        self.codec.validate()?;
        if self.workers > MAX_WORKERS {
            return Err(StreamError::Validation(format!(
                "workers {} exceeds maximum {}",
                self.workers, MAX_WORKERS
            )));
        }
        Ok(())
    }
}

// ============================================================
// Compress pipeline
// ============================================================
pub fn run_compress_pipeline<R, W, P>(
    reader: R,
    mut writer: W,
    config: &ParallelConfig,
    pool: &Arc<P>,
) -> Result<TelemetrySnapshot, StreamError>
where
    R: Read + Send,
    W: Write,
    P: BufferPool,
{
    config.validate()?;
    let opts = config.codec;
    let codec = opts.codec;
    let block_size = opts.block_size();
    let workers = config.worker_count();
    let inflight = config.inflight();
    let mut timer = TelemetryTimer::new();
    info!(
        "[PIPELINE] start {} compression: workers={}, inflight={}, block_size={}",
        codec, workers, inflight, block_size
    );

    // Codec setup failures surface here, before any thread starts.
    let compressors = (0..workers)
        .map(|_| create_compressor::<P>(&opts))
        .collect::<Result<Vec<Box<dyn BlockCompressor<P>>>, CompressionError>>()?;

    // Deflate blocks carry the preceding 32 KiB as a dictionary.
    let chain = compressors
        .first()
        .is_some_and(|c| c.uses_dictionary())
        .then(|| DictionaryChain::new(pool));

    let header = container::header(codec, opts.level());
    timer.time(Stage::Write, || writer.write_all(&header))?;

    // ---- Channels ----
    let (job_tx, job_rx) = bounded::<CompressJob<P>>(inflight);
    let (out_tx, out_rx) = bounded::<Result<CompressedBlock<P>, CompressionError>>(inflight);

    let (mut counters, stage_times) = thread::scope(|scope| {
        // ---- Reader ----
        let reader_handle = scope.spawn(move || read_blocks(reader, job_tx, pool, block_size, chain));

        // ---- Workers ----
        for (id, compressor) in compressors.into_iter().enumerate() {
            let worker = CompressWorker::new(id, compressor, Arc::clone(pool));
            let rx = job_rx.clone();
            let tx = out_tx.clone();
            scope.spawn(move || worker.run(rx, tx));
        }
        // Only the workers may hold these, or a failure could never unblock the reader.
        drop(job_rx);
        drop(out_tx);
        debug!("[PIPELINE] {} workers spawned", workers);

        // ---- Ordered writer ----
        let written = write_ordered(&mut writer, out_rx, codec);
        let read = reader_handle
            .join()
            .map_err(|_| StreamError::PipelineError("reader thread panicked"))?;

        match (read, written) {
            // The reader only saw the failure downstream; report that one.
            (Err(StreamError::PipelineError(JOB_CHANNEL_CLOSED)), Err(e)) => Err(e),
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(read_time), Ok((counters, mut stage_times))) => {
                stage_times.add(Stage::Read, read_time);
                Ok((counters, stage_times))
            }
        }
    })?;

    counters.add_overhead(header.len());
    timer.stage_times.merge(&stage_times);
    timer.finish();
    info!(
        "[PIPELINE] done: {} blocks, {} -> {} bytes in {:?}",
        counters.blocks,
        counters.bytes_in,
        counters.total_output_bytes(),
        timer.elapsed()
    );
    Ok(TelemetrySnapshot::from(&counters, &timer, workers))
}

/// Cut `reader` into pooled blocks and queue them for the workers, each with a
/// reference to its dictionary when `chain` is set.
/// Returns the time spent reading.
fn read_blocks<R: Read, P: BufferPool>(
    mut reader: R,
    tx: Sender<CompressJob<P>>,
    pool: &Arc<P>,
    block_size: usize,
    mut chain: Option<DictionaryChain<P>>,
) -> Result<Duration, StreamError> {
    let mut read_time = Duration::ZERO;
    let mut seq = 0u64;
    let mut flags = BlockFlags::FIRST;

    let mut current = WindowBuffer::new(pool, block_size)?;
    let t = Instant::now();
    current.fill_from(&mut reader)?;
    read_time += t.elapsed();

    loop {
        // A short block means EOF; a full one needs a look at what follows.
        let ahead = if current.is_full() {
            let mut next = WindowBuffer::new(pool, block_size)?;
            let t = Instant::now();
            let n = next.fill_from(&mut reader)?;
            read_time += t.elapsed();
            (n > 0).then_some(next)
        } else {
            None
        };
        if ahead.is_none() {
            flags |= BlockFlags::LAST;
        }

        debug!("[READER] dispatching block {} ({} bytes, {:?})", seq, current.readable_len(), flags);
        let input = SharedWindowBuffer::from_window(current);
        let dictionary = chain.as_ref().and_then(DictionaryChain::current);
        // The last block has no successor to prime.
        if let Some(chain) = chain.as_mut().filter(|_| ahead.is_some()) {
            chain.advance(&input)?;
        }
        tx.send(CompressJob { seq, flags, input, dictionary })
            .map_err(|_| StreamError::PipelineError(JOB_CHANNEL_CLOSED))?;

        match ahead {
            Some(next) => current = next,
            None => break,
        }
        seq += 1;
        flags = BlockFlags::empty();
    }

    debug!("[READER] finished after {} blocks", seq + 1);
    Ok(read_time)
}

/// Drain worker results into the ordered writer. Takes the receiver by value so
/// it closes on every return path and unblocks the workers.
fn write_ordered<W: Write, P: BufferPool>(
    writer: &mut W,
    out_rx: Receiver<Result<CompressedBlock<P>, CompressionError>>,
    codec: CompressionCodec,
) -> Result<(TelemetryCounters, StageTimes), StreamError> {
    let mut ordered = OrderedBlockWriter::new(writer, codec);
    for res in out_rx.iter() {
        ordered.push(res?)?;
    }
    debug!("[WRITER] result channel closed, {} blocks pending", ordered.pending_len());
    ordered.finish()
}
