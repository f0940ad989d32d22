//! Error types for reading and writing delimited files.
//!
//! Every fallible public operation returns [`Result<T>`]. Codecs report their
//! own failures with [`anyhow::Error`]; those are wrapped into
//! [`Error::Format`] together with the line they belong to.

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed source error carried by [`Error::Format`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by `ironcsv`.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened, read, created or written.
    #[error("I/O error ({context}): {source}")]
    Io {
        /// What was being attempted, e.g. `open data.csv`.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line could not be decoded into a record, or a record could not be
    /// encoded into a line.
    #[error("format error at line {line}{}: {source} (content: {content:?})", chunk_suffix(.chunk))]
    Format {
        /// 1-based line number in the file (the header is line 1). For encode
        /// failures, the 1-based row number.
        line: usize,
        /// Chunk index when the failure happened on a parallel read.
        chunk: Option<usize>,
        /// The offending line, or the partial encoding when known.
        content: String,
        /// The codec's own error.
        #[source]
        source: BoxError,
    },

    /// The requested mode, option or field type has no implementation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Internal state was used out of order. Always a programming error.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A worker thread panicked while decoding.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker in its pool.
        worker: usize,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

fn chunk_suffix(chunk: &Option<usize>) -> String {
    match chunk {
        Some(c) => format!(" (chunk {c})"),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn format(
        line: usize,
        chunk: Option<usize>,
        content: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::Format {
            line,
            chunk,
            content: content.into(),
            source: source.into(),
        }
    }

    /// Line number of a [`Error::Format`] failure.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Format { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Returns `true` for [`Error::Format`].
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns `true` for [`Error::Io`].
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
