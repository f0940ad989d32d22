//! Read and write options.
//!
//! Both option structs deserialize from JSON (or any Serde format) with every
//! field optional, so a config file only needs to name what it changes:
//!
//! ```
//! use ironcsv::{ReadMode, ReadOptions};
//!
//! let opts = ReadOptions::from_json(r#"{ "mode": "sequential" }"#).unwrap();
//! assert_eq!(opts.mode, ReadMode::Sequential);
//! assert_eq!(opts.chunk_bytes, ironcsv::config::DEFAULT_CHUNK_BYTES);
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Expected length of one line, in bytes.
pub const LINE_LENGTH_HINT: usize = 1 << 10;

/// Lines per chunk the default chunk size is sized for.
pub const LINES_PER_CHUNK: usize = 1 << 5;

/// Default target chunk size for the parallel reader (32 KiB).
pub const DEFAULT_CHUNK_BYTES: usize = LINE_LENGTH_HINT * LINES_PER_CHUNK;

/// Default worker count: one per CPU, at least two.
pub fn default_workers() -> usize {
    num_cpus::get().max(2)
}

/// How a file is read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// One line at a time on the calling thread.
    Sequential,
    /// Chunked and decoded on a worker pool, reassembled in file order.
    #[default]
    Parallel,
}

impl FromStr for ReadMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(Self::Sequential),
            "parallel" | "par" => Ok(Self::Parallel),
            other => Err(Error::Unsupported(format!("reading mode {other:?}"))),
        }
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Parallel => f.write_str("parallel"),
        }
    }
}

/// Options for [`read_from_file`](crate::read_from_file) and
/// [`read_from_bytes`](crate::read_from_bytes).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    pub mode: ReadMode,
    /// Worker threads for [`ReadMode::Parallel`].
    pub workers: usize,
    /// Target size of one chunk before it is extended to the next line break.
    pub chunk_bytes: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            mode: ReadMode::default(),
            workers: default_workers(),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

impl ReadOptions {
    pub fn sequential() -> Self {
        Self {
            mode: ReadMode::Sequential,
            ..Self::default()
        }
    }

    pub fn parallel(workers: usize) -> Self {
        Self {
            mode: ReadMode::Parallel,
            workers,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes;
        self
    }

    /// Parse options from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    /// [`Error::Unsupported`] if the JSON is malformed or names an unknown
    /// mode.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Unsupported(format!("read options: {e}")))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.mode == ReadMode::Parallel && self.workers == 0 {
            return Err(Error::Unsupported("parallel read with zero workers".into()));
        }
        if self.chunk_bytes == 0 {
            return Err(Error::Unsupported("chunk size of zero bytes".into()));
        }
        Ok(())
    }
}

/// Options for [`write_rows_par`](crate::write_rows_par).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Number of contiguous slices encoded in parallel.
    pub workers: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl WriteOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Parse options from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    /// [`Error::Unsupported`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Unsupported(format!("write options: {e}")))
    }
}
