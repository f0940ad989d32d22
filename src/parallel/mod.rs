//! The parallel chunked reader's building blocks.
//!
//! - [`splitter`]: cuts the input body into line-aligned [`Chunk`]s
//! - [`pool`]: decodes chunks on a fixed set of worker threads
//! - [`collector`]: puts the decoded rows back in file order
//!
//! [`read_parallel`](crate::read_parallel) wires the three together; they are
//! public so callers can drive the pipeline by hand.

pub mod collector;
pub mod pool;
pub mod splitter;

pub use collector::{OrderedCollector, SlotId};
pub use pool::{JobOutcome, JobResult, WorkerPool};
pub use splitter::{Chunk, split};
