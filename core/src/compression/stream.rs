//! compression/stream.rs
//! Single-threaded compress/decompress over `Read`/`Write`, staged through pooled buffers.
//!
//! Design notes:
//! - Input is cut into `block_size` blocks; one block of read-ahead tells us
//!   which block is last, so the codec can finish the stream on it.
//! - Deflate blocks are primed from a `DictionaryChain` the same way the
//!   pipeline primes them.
//! - The output is the same byte stream the parallel pipeline produces for the
//!   same options.
//! - All staging buffers are leased from the caller's pool and go back on every
//!   exit path when they drop.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};

use crate::buffer::{BufferPool, SharedWindowBuffer, WindowBuffer};
use crate::compression::checksum::BlockChecksum;
use crate::compression::constants::{DEFAULT_DECODE_BUFFER_SIZE, MAX_BLOCK_SIZE};
use crate::compression::container;
use crate::compression::dictionary::{prime_from, DictionaryChain};
use crate::compression::registry::{create_compressor, create_decoder};
use crate::compression::types::{BlockFlags, CodecOptions, CompressionCodec, CompressionError};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};

/// Summary: Compress everything from `reader` into `writer`.
/// - Writes the container header and trailer for zlib/gzip.
/// - Returns counters and stage times for the run.
pub fn compress_stream<R, W, P>(
    mut reader: R,
    mut writer: W,
    opts: &CodecOptions,
    pool: &Arc<P>,
) -> Result<TelemetrySnapshot, CompressionError>
where
    R: Read,
    W: Write,
    P: BufferPool,
{
    let mut compressor = create_compressor::<P>(opts)?;
    let codec = opts.codec;
    let block_size = opts.block_size();
    let mut counters = TelemetryCounters::default();
    let mut timer = TelemetryTimer::new();
    let mut checksum = BlockChecksum::for_codec(codec);
    info!("[STREAM] compress start: codec={}, level={}, block_size={}", codec, opts.level(), block_size);

    let header = container::header(codec, opts.level());
    timer.time(Stage::Write, || writer.write_all(&header))?;
    counters.add_overhead(header.len());

    let mut output = WindowBuffer::new(pool, block_size)?;
    let mut current = WindowBuffer::new(pool, block_size)?;
    let mut dictionary = compressor.uses_dictionary().then(|| DictionaryChain::new(pool));

    timer.time(Stage::Read, || current.fill_from(&mut reader))?;
    let mut flags = BlockFlags::FIRST;
    loop {
        // A short block means EOF; a full one needs a look at what follows.
        let ahead = if current.is_full() {
            let mut next = WindowBuffer::new(pool, block_size)?;
            let n = timer.time(Stage::Read, || next.fill_from(&mut reader))?;
            (n > 0).then_some(next)
        } else {
            None
        };
        if ahead.is_none() {
            flags |= BlockFlags::LAST;
        }

        let t = Instant::now();
        if let Some(dict) = dictionary.as_ref().and_then(DictionaryChain::current) {
            prime_from(&mut *compressor, dict)?;
        }
        let produced = compressor.compress_block(current.readable(), &mut output, flags)?;
        if let Some(sum) = checksum.as_mut() {
            sum.update(current.readable());
        }
        timer.add_stage_time(Stage::Compress, t.elapsed());

        counters.add_block(current.readable_len(), produced);
        debug!("[STREAM] block {} in={} out={} flags={:?}", counters.blocks - 1, current.readable_len(), produced, flags);
        timer.time(Stage::Write, || output.drain_to(&mut writer))?;

        let Some(next) = ahead else { break };
        if let Some(chain) = dictionary.as_mut() {
            let input = SharedWindowBuffer::from_window(current);
            chain.advance(&input)?;
            input.release_ref();
        }
        current = next;
        flags = BlockFlags::empty();
    }

    let trailer = container::trailer(codec, checksum.as_ref(), counters.bytes_in);
    timer.time(Stage::Write, || -> std::io::Result<()> {
        writer.write_all(&trailer)?;
        writer.flush()
    })?;
    counters.add_overhead(trailer.len());

    timer.finish();
    info!("[STREAM] compress done: {} blocks, {} -> {} bytes", counters.blocks, counters.bytes_in, counters.total_output_bytes());
    Ok(TelemetrySnapshot::from(&counters, &timer, 1))
}

/// Summary: Decompress a whole `codec` stream from `reader` into `writer`.
/// - Pumps the decoder through one pooled staging buffer of `buffer_size` bytes
///   (`None` means `DEFAULT_DECODE_BUFFER_SIZE`).
pub fn decompress_stream<R, W, P>(
    reader: R,
    mut writer: W,
    codec: CompressionCodec,
    pool: &Arc<P>,
    buffer_size: Option<usize>,
) -> Result<TelemetrySnapshot, CompressionError>
where
    R: Read + Send,
    W: Write,
    P: BufferPool,
{
    let buffer_size = buffer_size.unwrap_or(DEFAULT_DECODE_BUFFER_SIZE);
    if buffer_size == 0 || buffer_size > MAX_BLOCK_SIZE {
        return Err(CompressionError::InvalidBlockSize { have: buffer_size, min: 1, max: MAX_BLOCK_SIZE });
    }

    let mut source = CountingReader { inner: reader, count: 0 };
    let mut decoder = create_decoder(codec, &mut source)?;
    let mut staging = WindowBuffer::new(pool, buffer_size)?;
    let mut counters = TelemetryCounters::default();
    let mut timer = TelemetryTimer::new();
    info!("[STREAM] decompress start: codec={}", codec);

    loop {
        let n = timer
            .time(Stage::Decompress, || staging.fill_from(&mut decoder))
            .map_err(|e| CompressionError::from_codec_io(codec, e))?;
        if n == 0 {
            break;
        }
        counters.add_block(0, n);
        timer.time(Stage::Write, || staging.drain_to(&mut writer))?;
    }
    timer.time(Stage::Write, || writer.flush())?;
    drop(decoder);
    counters.bytes_in = source.count;

    timer.finish();
    info!("[STREAM] decompress done: {} bytes", counters.bytes_out);
    Ok(TelemetrySnapshot::from(&counters, &timer, 1))
}

/// Counts bytes pulled from the compressed source.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}
