//! Fixed-size pool of decoding threads with one FIFO channel per worker.
//!
//! Jobs are assigned round-robin by chunk index. Shutting the pool down
//! closes every channel; each worker finishes what is queued, then exits and
//! hands its outcomes back through its join handle.
//!
//! Failure policy: the whole read is aborted. The lowest failing chunk index
//! is kept in an atomic watermark. Jobs above the watermark are skipped
//! without decoding; jobs below it always run, so the failure reported to the
//! caller is the first bad line in file order.

use crate::codec::{RecordCodec, decode_line};
use crate::error::{Error, Result};
use crate::io::line_store::chunk_lines;
use crate::parallel::collector::SlotId;
use crate::parallel::splitter::Chunk;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// What happened to one submitted job.
#[derive(Debug)]
pub enum JobResult<R> {
    /// Every line of the chunk decoded, in order.
    Decoded(Vec<R>),
    /// Decoding stopped at the first bad line.
    Failed(Error),
    /// Not decoded because a chunk earlier in the file had already failed.
    Skipped,
}

/// Outcome of one job, tagged with the slot it was submitted for.
#[derive(Debug)]
pub struct JobOutcome<R> {
    pub slot: SlotId,
    pub chunk: usize,
    pub result: JobResult<R>,
}

struct Job {
    slot: SlotId,
    chunk: Chunk,
}

type WorkerHandle<R> = JoinHandle<Vec<JobOutcome<R>>>;

/// Worker threads owned by a single read call.
pub struct WorkerPool<C: RecordCodec> {
    senders: Vec<Sender<Job>>,
    handles: Vec<WorkerHandle<C::Record>>,
    submitted: usize,
}

impl<C: RecordCodec + 'static> WorkerPool<C> {
    /// Spawn `size` workers sharing `codec`.
    ///
    /// # Errors
    /// [`Error::Unsupported`] for a zero-sized pool, [`Error::Io`] if a
    /// thread cannot be spawned. Workers spawned before the failure are
    /// joined before returning.
    pub fn start(size: usize, codec: Arc<C>) -> Result<Self> {
        if size == 0 {
            return Err(Error::Unsupported("worker pool of size zero".into()));
        }
        let watermark = Arc::new(AtomicUsize::new(usize::MAX));
        let mut pool = Self {
            senders: Vec::with_capacity(size),
            handles: Vec::with_capacity(size),
            submitted: 0,
        };
        for worker in 0..size {
            let (tx, rx) = unbounded::<Job>();
            let codec = Arc::clone(&codec);
            let watermark = Arc::clone(&watermark);
            let handle = thread::Builder::new()
                .name(format!("ironcsv-reader-{worker}"))
                .spawn(move || run_worker(worker, rx, &*codec, &watermark))
                .map_err(|e| Error::io("spawn worker thread", e))?;
            pool.senders.push(tx);
            pool.handles.push(handle);
        }
        debug!(workers = size, "worker pool started");
        Ok(pool)
    }
}

impl<C: RecordCodec> WorkerPool<C> {
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Number of jobs accepted so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Queue `chunk` for decoding into `slot` on worker `chunk.index % size`.
    ///
    /// # Errors
    /// [`Error::InvariantViolation`] after [`shutdown`](Self::shutdown);
    /// [`Error::WorkerPanicked`] if the target worker has died.
    pub fn submit(&mut self, slot: SlotId, chunk: Chunk) -> Result<()> {
        if self.senders.is_empty() {
            return Err(Error::InvariantViolation(
                "job submitted to a pool that was shut down".into(),
            ));
        }
        let worker = chunk.index % self.senders.len();
        trace!(worker, chunk = chunk.index, bytes = chunk.len(), "dispatch");
        self.senders[worker]
            .send(Job { slot, chunk })
            .map_err(|_| Error::WorkerPanicked { worker })?;
        self.submitted += 1;
        Ok(())
    }

    /// Close every queue, wait for all workers to drain and join, and return
    /// their outcomes. A second call returns an empty list.
    ///
    /// # Errors
    /// [`Error::WorkerPanicked`] for the first worker that panicked; every
    /// other worker is still joined first.
    pub fn shutdown(&mut self) -> Result<Vec<JobOutcome<C::Record>>> {
        self.senders.clear();
        let mut outcomes = Vec::with_capacity(self.submitted);
        let mut panicked = None;
        for (worker, handle) in self.handles.drain(..).enumerate() {
            match handle.join() {
                Ok(done) => outcomes.extend(done),
                Err(_) => {
                    warn!(worker, "worker thread panicked");
                    panicked.get_or_insert(worker);
                }
            }
        }
        if let Some(worker) = panicked {
            return Err(Error::WorkerPanicked { worker });
        }
        if !outcomes.is_empty() {
            debug!(jobs = outcomes.len(), "worker pool drained");
        }
        Ok(outcomes)
    }
}

impl<C: RecordCodec> Drop for WorkerPool<C> {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            let _ = self.shutdown();
        }
    }
}

fn run_worker<C: RecordCodec + ?Sized>(
    worker: usize,
    rx: Receiver<Job>,
    codec: &C,
    watermark: &AtomicUsize,
) -> Vec<JobOutcome<C::Record>> {
    let mut outcomes = Vec::new();
    for Job { slot, chunk } in rx.iter() {
        let result = if chunk.index > watermark.load(Ordering::Acquire) {
            trace!(worker, chunk = chunk.index, "skipped after earlier failure");
            JobResult::Skipped
        } else {
            match decode_chunk(codec, &chunk) {
                Ok(rows) => JobResult::Decoded(rows),
                Err(e) => {
                    warn!(worker, chunk = chunk.index, error = %e, "chunk failed to decode");
                    watermark.fetch_min(chunk.index, Ordering::AcqRel);
                    JobResult::Failed(e)
                }
            }
        };
        outcomes.push(JobOutcome {
            slot,
            chunk: chunk.index,
            result,
        });
    }
    outcomes
}

/// Decode every non-blank line of `chunk` in order.
pub(crate) fn decode_chunk<C: RecordCodec + ?Sized>(
    codec: &C,
    chunk: &Chunk,
) -> Result<Vec<C::Record>> {
    let delimiter = codec.delimiter();
    chunk_lines(&chunk.bytes)
        .map(|(offset, line)| {
            decode_line(
                codec,
                line,
                delimiter,
                chunk.first_line + offset,
                Some(chunk.index),
            )
        })
        .collect()
}
