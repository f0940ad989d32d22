use super::RecordCodec;
use crate::error::Error;
use anyhow::{Context, Result, anyhow, bail};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Codec for any Serde type, one record per unquoted line.
///
/// Fields are mapped positionally, the way the `csv` crate maps a record
/// without headers. Quoting is disabled in both directions, so a field that
/// contains the delimiter cannot round-trip.
///
/// ```
/// use ironcsv::{RecordCodec, SerdeCodec};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Reading { sensor: String, value: f64 }
///
/// let codec = SerdeCodec::<Reading>::new();
/// let r = codec.decode("t1,21.5", ',').unwrap();
/// assert_eq!(r, Reading { sensor: "t1".into(), value: 21.5 });
/// assert_eq!(codec.encode(&r, ',').unwrap(), "t1,21.5");
/// ```
#[derive(Debug)]
pub struct SerdeCodec<T> {
    delimiter: char,
    _t: PhantomData<fn() -> T>,
}

impl<T> SerdeCodec<T> {
    pub fn new() -> Self {
        Self {
            delimiter: super::DEFAULT_DELIMITER,
            _t: PhantomData,
        }
    }

    /// Use `delimiter` instead of `,`.
    ///
    /// # Errors
    /// [`Error::Unsupported`] if `delimiter` is not a single ASCII character,
    /// which is all the underlying `csv` machinery accepts.
    pub fn with_delimiter(mut self, delimiter: char) -> crate::Result<Self> {
        if !delimiter.is_ascii() {
            return Err(Error::Unsupported(format!(
                "delimiter {delimiter:?} is not ASCII"
            )));
        }
        self.delimiter = delimiter;
        Ok(self)
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn ascii(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("delimiter {delimiter:?} is not ASCII");
    }
    Ok(delimiter as u8)
}

impl<T> RecordCodec for SerdeCodec<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Record = T;

    fn encode(&self, record: &T, delimiter: char) -> Result<String> {
        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .delimiter(ascii(delimiter)?)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::with_capacity(64));
        wtr.serialize(record).context("serialize record")?;
        let mut buf = wtr
            .into_inner()
            .map_err(|e| anyhow!("flush record buffer: {}", e.error()))?;
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        String::from_utf8(buf).context("encoded record is not UTF-8")
    }

    fn decode(&self, line: &str, delimiter: char) -> Result<T> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(ascii(delimiter)?)
            .quoting(false)
            .from_reader(line.as_bytes());
        match rdr.deserialize::<T>().next() {
            Some(rec) => rec.context("deserialize record"),
            None => bail!("line holds no record"),
        }
    }

    fn delimiter(&self) -> char {
        self.delimiter
    }
}
