//! In-memory line source shared by the sequential reader and the chunk
//! splitter.
//!
//! A [`LineStore`] owns the whole (decompressed) input as one immutable
//! [`Bytes`] buffer plus a read cursor. Everything it hands out is a
//! zero-copy `Bytes` slice of that buffer, so chunks given to worker threads
//! never alias mutable memory.

use crate::error::{Error, Result};
use crate::io::compression::auto_detect_reader;
use bytes::Bytes;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Line terminator. A `\r` before it is stripped by [`clean_line`].
pub const LINE_TERMINATOR: u8 = b'\n';

/// Sequential cursor over an immutable byte buffer.
#[derive(Clone, Debug)]
pub struct LineStore {
    buf: Bytes,
    pos: usize,
    lines_consumed: usize,
}

impl LineStore {
    pub fn from_bytes(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            pos: 0,
            lines_consumed: 0,
        }
    }

    /// Read the whole file at `path`, decompressing it if its extension or
    /// magic bytes name a known codec.
    ///
    /// # Errors
    /// [`Error::Io`] if the file cannot be opened or read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
        let size_hint = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
        let mut rdr = auto_detect_reader(file, path)
            .map_err(|e| Error::io(format!("setup decompression for {}", path.display()), e))?;
        let mut buf = Vec::with_capacity(size_hint);
        rdr.read_to_end(&mut buf)
            .map_err(|e| Error::io(format!("read {}", path.display()), e))?;
        tracing::debug!(path = %path.display(), bytes = buf.len(), "loaded input");
        Ok(Self::from_bytes(buf))
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// 1-based number of the line the cursor is on.
    pub fn next_line_number(&self) -> usize {
        self.lines_consumed + 1
    }

    /// Unread bytes, without moving the cursor.
    pub fn rest(&self) -> Bytes {
        self.buf.slice(self.pos..)
    }

    /// Next line without its terminator, or `None` once exhausted.
    ///
    /// A final line with no terminator is still returned.
    pub fn next_line(&mut self) -> Option<Bytes> {
        if self.is_exhausted() {
            return None;
        }
        let start = self.pos;
        let end = match find_terminator(&self.buf[start..]) {
            Some(i) => {
                self.pos = start + i + 1;
                self.lines_consumed += 1;
                start + i
            }
            None => {
                self.pos = self.buf.len();
                self.buf.len()
            }
        };
        Some(self.buf.slice(start..end))
    }

    /// Take up to `max` raw bytes, regardless of line boundaries.
    pub fn read_block(&mut self, max: usize) -> Bytes {
        let start = self.pos;
        let end = start.saturating_add(max).min(self.buf.len());
        self.advance_to(end);
        self.buf.slice(start..end)
    }

    /// Take a single raw byte.
    pub fn next_byte(&mut self) -> Option<u8> {
        let b = *self.buf.get(self.pos)?;
        self.advance_to(self.pos + 1);
        Some(b)
    }

    /// `true` when the cursor sits at the start of a line (or of the buffer).
    pub fn at_line_start(&self) -> bool {
        self.pos == 0 || self.buf[self.pos - 1] == LINE_TERMINATOR
    }

    /// Bytes between `start` and the cursor. `start` must not be past the
    /// cursor.
    pub(crate) fn slice_from(&self, start: usize) -> Bytes {
        debug_assert!(start <= self.pos);
        self.buf.slice(start..self.pos)
    }

    fn advance_to(&mut self, end: usize) {
        self.lines_consumed += count_terminators(&self.buf[self.pos..end]);
        self.pos = end;
    }
}

fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == LINE_TERMINATOR)
}

pub(crate) fn count_terminators(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == LINE_TERMINATOR).count()
}

/// Strip a trailing `\r`; `None` for a blank line, which both readers skip.
pub fn clean_line(raw: &[u8]) -> Option<&[u8]> {
    let line = raw.strip_suffix(b"\r").unwrap_or(raw);
    (!line.is_empty()).then_some(line)
}

/// Lines of a chunk with their 0-based offset inside it, blank lines
/// removed. The piece after the final terminator is always empty for a
/// line-aligned chunk and so never yielded.
pub fn chunk_lines(bytes: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    bytes
        .split(|&b| b == LINE_TERMINATOR)
        .enumerate()
        .filter_map(|(i, raw)| clean_line(raw).map(|line| (i, line)))
}
