//! Sequential and parallel readers.
//!
//! Both readers share header parsing and line cleaning (`\r` stripped, blank
//! lines skipped), so for any input the parallel reader returns exactly the
//! rows the sequential reader returns, or fails on the same line.

use crate::codec::{RecordCodec, decode_line, parse_header};
use crate::config::{ReadMode, ReadOptions};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::io::LineStore;
use crate::io::line_store::clean_line;
use crate::parallel::{JobResult, OrderedCollector, WorkerPool, split};
use anyhow::Context;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Read the whole file at `path` with `codec`, in the mode `opts` selects.
///
/// The file is loaded (and decompressed, see
/// [`compression`](crate::io::compression)) before any decoding starts, so an
/// unreadable file fails before a worker thread exists.
///
/// # Errors
/// [`Error::Io`] if the file cannot be read, [`Error::Format`] for the first
/// line that does not decode, [`Error::Unsupported`] for invalid options.
///
/// # Example
/// ```no_run
/// use ironcsv::{ReadOptions, read_from_file};
/// use ironcsv::testing::PersonCodec;
///
/// let doc = read_from_file("persons.csv", PersonCodec, &ReadOptions::default())?;
/// println!("{:?}: {} rows", doc.header, doc.rows.len());
/// # Ok::<(), ironcsv::Error>(())
/// ```
pub fn read_from_file<C>(
    path: impl AsRef<Path>,
    codec: C,
    opts: &ReadOptions,
) -> Result<Document<C::Record>>
where
    C: RecordCodec + 'static,
{
    opts.validate()?;
    let store = LineStore::open(path)?;
    read_store(store, codec, opts)
}

/// Like [`read_from_file`], over bytes already in memory.
///
/// # Errors
/// See [`read_from_file`].
pub fn read_from_bytes<C>(
    bytes: impl Into<Bytes>,
    codec: C,
    opts: &ReadOptions,
) -> Result<Document<C::Record>>
where
    C: RecordCodec + 'static,
{
    opts.validate()?;
    read_store(LineStore::from_bytes(bytes), codec, opts)
}

fn read_store<C>(store: LineStore, codec: C, opts: &ReadOptions) -> Result<Document<C::Record>>
where
    C: RecordCodec + 'static,
{
    match opts.mode {
        ReadMode::Sequential => read_sequential(store, &codec),
        ReadMode::Parallel => read_parallel(store, Arc::new(codec), opts.workers, opts.chunk_bytes),
    }
}

/// Consume the header line, if there is one.
fn read_header<C: RecordCodec + ?Sized>(store: &mut LineStore, codec: &C) -> Result<Vec<String>> {
    let line_no = store.next_line_number();
    let Some(raw) = store.next_line() else {
        return Ok(Vec::new());
    };
    let line = std::str::from_utf8(&raw)
        .context("header is not valid UTF-8")
        .map_err(|e| Error::format(line_no, None, String::from_utf8_lossy(&raw), e))?;
    Ok(parse_header(line, codec.delimiter()))
}

/// Read the header, then decode one line at a time on the calling thread.
///
/// # Errors
/// [`Error::Format`] for the first line that does not decode.
pub fn read_sequential<C>(mut store: LineStore, codec: &C) -> Result<Document<C::Record>>
where
    C: RecordCodec + ?Sized,
{
    let header = read_header(&mut store, codec)?;
    let delimiter = codec.delimiter();
    let mut rows = Vec::new();
    loop {
        let line_no = store.next_line_number();
        let Some(raw) = store.next_line() else { break };
        if let Some(line) = clean_line(&raw) {
            rows.push(decode_line(codec, line, delimiter, line_no, None)?);
        }
    }
    Ok(Document::new(header, rows))
}

/// Read the header, split the body into line-aligned chunks of about
/// `chunk_bytes`, decode them on `workers` threads and reassemble the rows in
/// file order.
///
/// No thread is started for an empty body, and never more threads than
/// chunks. On failure every worker is joined before the error is returned,
/// and no rows are returned.
///
/// # Errors
/// [`Error::Format`] for the first bad line in file order,
/// [`Error::Unsupported`] for zero `workers` or `chunk_bytes`,
/// [`Error::WorkerPanicked`] if the codec panicked.
pub fn read_parallel<C>(
    mut store: LineStore,
    codec: Arc<C>,
    workers: usize,
    chunk_bytes: usize,
) -> Result<Document<C::Record>>
where
    C: RecordCodec + 'static,
{
    if workers == 0 {
        return Err(Error::Unsupported("parallel read with zero workers".into()));
    }
    let header = read_header(&mut store, &*codec)?;
    let chunks = split(&mut store, chunk_bytes)?;
    if chunks.is_empty() {
        debug!("empty body, no workers started");
        return Ok(Document::new(header, Vec::new()));
    }

    let mut collector = OrderedCollector::new();
    let slots = collector.reserve(chunks.len());
    let mut pool = WorkerPool::start(workers.min(chunks.len()), codec)?;
    for (slot, chunk) in slots.into_iter().zip(chunks) {
        pool.submit(slot, chunk)?;
    }
    let outcomes = pool.shutdown()?;
    collector.mark_drained();

    let mut first_failure: Option<(usize, Error)> = None;
    for outcome in outcomes {
        match outcome.result {
            JobResult::Decoded(rows) => collector.fill(outcome.slot, rows)?,
            JobResult::Failed(e) => {
                if first_failure.as_ref().is_none_or(|(chunk, _)| outcome.chunk < *chunk) {
                    first_failure = Some((outcome.chunk, e));
                }
            }
            JobResult::Skipped => {}
        }
    }
    if let Some((_, e)) = first_failure {
        return Err(e);
    }
    let rows = collector.finalize()?;
    Ok(Document::new(header, rows))
}
