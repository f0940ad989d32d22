//! Sequential and parallel writers.
//!
//! Both writers build the whole output in memory and write it to the
//! destination once. The parallel writer encodes contiguous slices of the
//! rows on the rayon pool and concatenates the buffers in slice order, so its
//! output is byte-identical to the sequential writer's.

use crate::codec::{RecordCodec, encode_header, encode_line};
use crate::error::{Error, Result};
use crate::io::compression::auto_detect_writer;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::Path;

#[cfg(feature = "parallel-io")]
use crate::config::WriteOptions;

/// Write `rows` to `path`, one encoded line each, preceded by `header` when
/// given and non-empty.
///
/// Parent directories are created as needed. A `.gz`, `.zst`, `.bz2` or
/// `.xz` extension compresses the output.
///
/// # Returns
/// The number of rows written.
///
/// # Errors
/// [`Error::Io`] if the file cannot be created or written,
/// [`Error::Format`] if a row fails to encode (`line` is the 1-based row
/// number). Nothing is written when encoding fails.
pub fn write_rows<C>(
    path: impl AsRef<Path>,
    rows: &[C::Record],
    header: Option<&[String]>,
    codec: &C,
) -> Result<usize>
where
    C: RecordCodec + ?Sized,
{
    let delimiter = codec.delimiter();
    let body = encode_rows(codec, rows, 0, delimiter)?;
    write_output(path.as_ref(), header_bytes(header, delimiter), &[body])?;
    Ok(rows.len())
}

/// Parallel counterpart of [`write_rows`] with the same output.
///
/// The rows are cut into `opts.workers` contiguous slices of
/// `rows.len() / workers` rows, the last slice also taking the remainder.
/// With fewer rows than workers this is just [`write_rows`].
///
/// # Errors
/// See [`write_rows`]; additionally [`Error::Unsupported`] for zero workers.
///
/// # Feature
/// Requires the `parallel-io` feature.
#[cfg(feature = "parallel-io")]
pub fn write_rows_par<C>(
    path: impl AsRef<Path>,
    rows: &[C::Record],
    header: Option<&[String]>,
    codec: &C,
    opts: &WriteOptions,
) -> Result<usize>
where
    C: RecordCodec + ?Sized,
    C::Record: Sync,
{
    use rayon::prelude::*;

    let workers = opts.workers;
    if workers == 0 {
        return Err(Error::Unsupported("parallel write with zero workers".into()));
    }
    if rows.len() < workers {
        tracing::debug!(rows = rows.len(), workers, "too few rows, writing sequentially");
        return write_rows(path, rows, header, codec);
    }

    let delimiter = codec.delimiter();
    let buffers = slice_ranges(rows.len(), workers)
        .into_par_iter()
        .map(|(start, end)| encode_rows(codec, &rows[start..end], start, delimiter))
        .collect::<Result<Vec<_>>>()?;
    write_output(path.as_ref(), header_bytes(header, delimiter), &buffers)?;
    Ok(rows.len())
}

/// `parts` contiguous `[start, end)` ranges over `len` items: `len / parts`
/// each, with the remainder folded into the last range. Requires
/// `1 <= parts <= len`.
#[cfg(feature = "parallel-io")]
pub(crate) fn slice_ranges(len: usize, parts: usize) -> Vec<(usize, usize)> {
    let base = len / parts;
    (0..parts)
        .map(|i| {
            let start = i * base;
            let end = if i + 1 == parts { len } else { start + base };
            (start, end)
        })
        .collect()
}

fn header_bytes(header: Option<&[String]>, delimiter: char) -> Vec<u8> {
    match header {
        Some(columns) if !columns.is_empty() => {
            let mut line = encode_header(columns, delimiter).into_bytes();
            line.push(b'\n');
            line
        }
        _ => Vec::new(),
    }
}

/// Encode `rows` into one buffer; `offset` is the index of `rows[0]` in the
/// full row set, for error messages.
fn encode_rows<C>(codec: &C, rows: &[C::Record], offset: usize, delimiter: char) -> Result<Vec<u8>>
where
    C: RecordCodec + ?Sized,
{
    let mut buf = Vec::with_capacity(rows.len().saturating_mul(32));
    for (i, row) in rows.iter().enumerate() {
        let line = encode_line(codec, row, delimiter, offset + i + 1)?;
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }
    Ok(buf)
}

fn write_output(path: &Path, header: Vec<u8>, parts: &[Vec<u8>]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent)
            .map_err(|e| Error::io(format!("mkdir -p {}", parent.display()), e))?;
    }
    let file = File::create(path).map_err(|e| Error::io(format!("create {}", path.display()), e))?;
    let mut w = auto_detect_writer(file, path)
        .map_err(|e| Error::io(format!("setup compression for {}", path.display()), e))?;
    let written = |e| Error::io(format!("write {}", path.display()), e);
    w.write_all(&header).map_err(written)?;
    for part in parts {
        w.write_all(part).map_err(written)?;
    }
    w.finish().map_err(written)?;
    tracing::debug!(path = %path.display(), "wrote output");
    Ok(())
}
