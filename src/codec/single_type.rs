use super::RecordCodec;
use anyhow::{Context, Result, bail};
use std::marker::PhantomData;

/// A field type that [`SingleTypeCodec`] knows how to parse and format.
///
/// Implemented for `String`, the common integer types and the float types.
/// Any other type is rejected at compile time by the trait bound.
pub trait Field: Sized + Send + 'static {
    /// Short type name used in error messages.
    const NAME: &'static str;

    fn parse_field(cell: &str) -> Result<Self>;

    fn format_field(&self, out: &mut String);
}

impl Field for String {
    const NAME: &'static str = "string";

    fn parse_field(cell: &str) -> Result<Self> {
        Ok(cell.to_string())
    }

    fn format_field(&self, out: &mut String) {
        out.push_str(self);
    }
}

macro_rules! numeric_field {
    ($($t:ty => $name:literal),* $(,)?) => {$(
        impl Field for $t {
            const NAME: &'static str = $name;

            fn parse_field(cell: &str) -> Result<Self> {
                cell.trim()
                    .parse::<$t>()
                    .with_context(|| format!("parse {:?} as {}", cell, $name))
            }

            fn format_field(&self, out: &mut String) {
                out.push_str(&self.to_string());
            }
        }
    )*};
}

numeric_field!(
    i32 => "i32",
    i64 => "i64",
    u32 => "u32",
    u64 => "u64",
    f32 => "f32",
    f64 => "f64",
);

/// Codec for rows whose fields all share one type, decoded as `Vec<T>`.
///
/// ```
/// use ironcsv::{RecordCodec, SingleTypeCodec};
///
/// let codec = SingleTypeCodec::<f32>::new();
/// assert_eq!(codec.decode("1,2.5,3", ',').unwrap(), vec![1.0, 2.5, 3.0]);
/// assert_eq!(codec.encode(&vec![1.0, 2.5], ',').unwrap(), "1,2.5");
/// ```
#[derive(Debug)]
pub struct SingleTypeCodec<T> {
    delimiter: char,
    _t: PhantomData<fn() -> T>,
}

impl<T: Field> SingleTypeCodec<T> {
    pub fn new() -> Self {
        Self {
            delimiter: super::DEFAULT_DELIMITER,
            _t: PhantomData,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl<T: Field> Default for SingleTypeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Field> RecordCodec for SingleTypeCodec<T> {
    type Record = Vec<T>;

    fn encode(&self, record: &Vec<T>, delimiter: char) -> Result<String> {
        if record.is_empty() {
            bail!("row has no fields to encode");
        }
        let mut line = String::new();
        for (i, field) in record.iter().enumerate() {
            if i > 0 {
                line.push(delimiter);
            }
            field.format_field(&mut line);
        }
        Ok(line)
    }

    fn decode(&self, line: &str, delimiter: char) -> Result<Vec<T>> {
        line.split(delimiter)
            .enumerate()
            .map(|(i, cell)| {
                T::parse_field(cell).with_context(|| format!("field #{} ({})", i + 1, T::NAME))
            })
            .collect()
    }

    fn delimiter(&self) -> char {
        self.delimiter
    }
}
