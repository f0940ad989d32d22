//! Record codecs: how one record becomes one line of text and back.
//!
//! A codec is the only piece of user code the readers and writers call. It
//! must be pure: the parallel reader shares one codec across all of its
//! worker threads behind an `Arc`, so `encode` and `decode` take `&self` and
//! the trait requires `Send + Sync`.
//!
//! Three codecs ship with the crate:
//! - [`FnCodec`] adapts a pair of closures,
//! - [`SingleTypeCodec`] reads rows where every field has the same type,
//! - [`SerdeCodec`] (feature `serde-codec`) maps any Serde type to one line.
//!
//! # Example
//! ```
//! use ironcsv::RecordCodec;
//!
//! #[derive(Debug, PartialEq)]
//! struct Person { name: String, age: u32 }
//!
//! struct PersonCodec;
//!
//! impl RecordCodec for PersonCodec {
//!     type Record = Person;
//!
//!     fn encode(&self, p: &Person, delimiter: char) -> anyhow::Result<String> {
//!         Ok(format!("{}{delimiter}{}", p.name, p.age))
//!     }
//!
//!     fn decode(&self, line: &str, delimiter: char) -> anyhow::Result<Person> {
//!         let (name, age) = line
//!             .split_once(delimiter)
//!             .ok_or_else(|| anyhow::anyhow!("expected two fields"))?;
//!         Ok(Person { name: name.to_string(), age: age.trim().parse()? })
//!     }
//! }
//!
//! let p = PersonCodec.decode("Bin,3", ',').unwrap();
//! assert_eq!(p, Person { name: "Bin".into(), age: 3 });
//! ```

mod single_type;

#[cfg(feature = "serde-codec")]
mod serde_csv;

pub use single_type::{Field, SingleTypeCodec};

#[cfg(feature = "serde-codec")]
pub use serde_csv::SerdeCodec;

use crate::error::Error;
use anyhow::{Context, Result};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Conversion strategy between one record and one line of text.
///
/// `encode` must not emit a line terminator; the writers add it and reject
/// lines that contain one. `decode` receives the line without its terminator.
pub trait RecordCodec: Send + Sync {
    /// The record type this codec produces and consumes.
    type Record: Send + 'static;

    /// Encode `record` as a single line, fields joined by `delimiter`.
    fn encode(&self, record: &Self::Record, delimiter: char) -> Result<String>;

    /// Decode a single line whose fields are joined by `delimiter`.
    fn decode(&self, line: &str, delimiter: char) -> Result<Self::Record>;

    /// Delimiter used for the header and for every row.
    fn delimiter(&self) -> char {
        DEFAULT_DELIMITER
    }
}

impl<C: RecordCodec + ?Sized> RecordCodec for Arc<C> {
    type Record = C::Record;

    fn encode(&self, record: &Self::Record, delimiter: char) -> Result<String> {
        (**self).encode(record, delimiter)
    }

    fn decode(&self, line: &str, delimiter: char) -> Result<Self::Record> {
        (**self).decode(line, delimiter)
    }

    fn delimiter(&self) -> char {
        (**self).delimiter()
    }
}

/// A codec built from an encode closure and a decode closure.
///
/// ```
/// use ironcsv::{FnCodec, RecordCodec};
///
/// let codec = FnCodec::new(
///     |v: &i64, _d| Ok(v.to_string()),
///     |line, _d| Ok(line.trim().parse::<i64>()?),
/// )
/// .with_delimiter(';');
///
/// assert_eq!(codec.encode(&42, codec.delimiter()).unwrap(), "42");
/// assert_eq!(codec.decode("7", ';').unwrap(), 7);
/// ```
pub struct FnCodec<R, E, D> {
    encode: E,
    decode: D,
    delimiter: char,
    _r: PhantomData<fn() -> R>,
}

impl<R, E, D> FnCodec<R, E, D>
where
    E: Fn(&R, char) -> Result<String> + Send + Sync,
    D: Fn(&str, char) -> Result<R> + Send + Sync,
{
    pub fn new(encode: E, decode: D) -> Self {
        Self {
            encode,
            decode,
            delimiter: DEFAULT_DELIMITER,
            _r: PhantomData,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl<R, E, D> RecordCodec for FnCodec<R, E, D>
where
    R: Send + 'static,
    E: Fn(&R, char) -> Result<String> + Send + Sync,
    D: Fn(&str, char) -> Result<R> + Send + Sync,
{
    type Record = R;

    fn encode(&self, record: &R, delimiter: char) -> Result<String> {
        (self.encode)(record, delimiter)
    }

    fn decode(&self, line: &str, delimiter: char) -> Result<R> {
        (self.decode)(line, delimiter)
    }

    fn delimiter(&self) -> char {
        self.delimiter
    }
}

impl<R, E, D> fmt::Debug for FnCodec<R, E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec")
            .field("delimiter", &self.delimiter)
            .finish_non_exhaustive()
    }
}

/// Split a header line into column names.
///
/// A single trailing delimiter is ignored so that `A,B,` and `A,B` read the
/// same. An empty line has no columns.
pub fn parse_header(line: &str, delimiter: char) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return Vec::new();
    }
    let line = line.strip_suffix(delimiter).unwrap_or(line);
    line.split(delimiter).map(str::to_string).collect()
}

/// Join column names with `delimiter`, without a trailing delimiter.
pub fn encode_header(columns: &[String], delimiter: char) -> String {
    let mut sep = [0u8; 4];
    columns.join(delimiter.encode_utf8(&mut sep))
}

/// Decode one cleaned line, attributing failures to file line `line_no`.
pub(crate) fn decode_line<C: RecordCodec + ?Sized>(
    codec: &C,
    raw: &[u8],
    delimiter: char,
    line_no: usize,
    chunk: Option<usize>,
) -> crate::Result<C::Record> {
    let decoded = std::str::from_utf8(raw)
        .context("line is not valid UTF-8")
        .and_then(|line| codec.decode(line, delimiter));
    decoded.map_err(|e| Error::format(line_no, chunk, String::from_utf8_lossy(raw), e))
}

/// Encode one record, rejecting output that would span several lines.
pub(crate) fn encode_line<C: RecordCodec + ?Sized>(
    codec: &C,
    record: &C::Record,
    delimiter: char,
    row_no: usize,
) -> crate::Result<String> {
    let line = codec
        .encode(record, delimiter)
        .map_err(|e| Error::format(row_no, None, String::new(), e))?;
    if line.contains('\n') {
        return Err(Error::format(
            row_no,
            None,
            line,
            anyhow::anyhow!("encoded record contains a line terminator"),
        ));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_parsing_handles_trailing_delimiter_and_cr() {
        assert_eq!(parse_header("Names,Age", ','), vec!["Names", "Age"]);
        assert_eq!(parse_header("Names,Age,", ','), vec!["Names", "Age"]);
        assert_eq!(parse_header("Names;Age\r", ';'), vec!["Names", "Age"]);
        assert!(parse_header("", ',').is_empty());
    }

    #[test]
    fn header_encoding_has_no_trailing_delimiter() {
        let cols = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(encode_header(&cols, ','), "A,B,C");
        assert_eq!(encode_header(&cols, '\t'), "A\tB\tC");
        assert_eq!(encode_header(&[], ','), "");
    }

    #[test]
    fn fn_codec_uses_its_delimiter() -> anyhow::Result<()> {
        let codec = FnCodec::new(
            |v: &(String, u8), d| Ok(format!("{}{d}{}", v.0, v.1)),
            |line, d| {
                let (a, b) = line
                    .split_once(d)
                    .ok_or_else(|| anyhow::anyhow!("missing delimiter"))?;
                Ok((a.to_string(), b.parse()?))
            },
        )
        .with_delimiter('|');
        let d = codec.delimiter();
        let line = codec.encode(&("x".to_string(), 9), d)?;
        assert_eq!(line, "x|9");
        assert_eq!(codec.decode(&line, d)?, ("x".to_string(), 9));
        assert!(codec.decode("x,9", d).is_err());
        Ok(())
    }
}
