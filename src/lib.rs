//! # ironcsv
//!
//! Typed I/O for **delimited-row files**: one header line of column names,
//! then one record per line, fields joined by a single-character delimiter.
//! A user-supplied [`RecordCodec`] turns each line into a typed record and
//! back; `ironcsv` handles files, ordering and parallelism.
//!
//! ## Key Features
//!
//! - **Parallel chunked reader** - the body is cut into line-aligned chunks,
//!   decoded on a pool of worker threads and reassembled in file order
//! - **Sequential reader** - one line at a time, the reference behaviour the
//!   parallel reader matches row for row
//! - **Deterministic parallel writer** - slices encoded in parallel, written
//!   in slice order (feature `parallel-io`)
//! - **Pluggable codecs** - implement [`RecordCodec`], pass a closure pair
//!   ([`FnCodec`]), read same-typed rows ([`SingleTypeCodec`]) or map Serde
//!   types ([`SerdeCodec`], feature `serde-codec`)
//! - **Transparent compression** - gzip, zstd, bzip2 and xz by extension or
//!   magic bytes
//!
//! ## Quick Start
//!
//! ```
//! use ironcsv::testing::{Person, PersonCodec, person_header};
//! use ironcsv::{ReadOptions, read_from_file, write_rows};
//! # fn main() -> anyhow::Result<()> {
//! # let dir = tempfile::tempdir()?;
//! # let path = dir.path().join("persons.csv");
//!
//! let rows = vec![Person::new("Bin", 3), Person::new("Ben", 5)];
//! write_rows(&path, &rows, Some(person_header().as_slice()), &PersonCodec)?;
//!
//! // Parallel is the default reading mode.
//! let doc = read_from_file(&path, PersonCodec, &ReadOptions::default())?;
//! assert_eq!(doc.header, vec!["Names", "Age"]);
//! assert_eq!(doc.rows, rows);
//! # Ok(())
//! # }
//! ```
//!
//! ## File format
//!
//! Lines end with `\n` (a preceding `\r` is ignored on read). Blank lines in
//! the body are skipped. There is no quoting or escaping: a field containing
//! the delimiter cannot be represented. This is a property of the format,
//! not a bug.
//!
//! ## Errors
//!
//! Every operation returns [`Result`]. A read either yields the complete
//! [`Document`] in file order or fails; rows decoded before a failure are
//! never returned. See [`Error`] for the kinds.
//!
//! ## Module Overview
//!
//! - [`codec`] - the codec trait and the built-in codecs
//! - [`reader`] - sequential and parallel readers
//! - [`writer`] - sequential and parallel writers
//! - [`parallel`] - splitter, worker pool and ordered collector
//! - [`io`] - line store and compression
//! - [`config`] - read/write options
//! - [`testing`] - fixtures and assertions for tests

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod parallel;
pub mod reader;
pub mod testing;
pub mod writer;

// General re-exports
pub use codec::{FnCodec, RecordCodec, SingleTypeCodec, encode_header, parse_header};
pub use config::{ReadMode, ReadOptions, WriteOptions};
pub use document::Document;
pub use error::{Error, Result};
pub use io::LineStore;
pub use reader::{read_from_bytes, read_from_file, read_parallel, read_sequential};
pub use writer::write_rows;

// Gated re-exports
#[cfg(feature = "serde-codec")]
pub use codec::SerdeCodec;

#[cfg(feature = "parallel-io")]
pub use writer::write_rows_par;
