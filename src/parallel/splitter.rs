//! Line-aligned chunking of the input body.

use crate::error::{Error, Result};
use crate::io::LineStore;
use crate::io::line_store::LINE_TERMINATOR;
use bytes::Bytes;

/// A contiguous run of whole lines handed to one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Position in submission order, 0-based.
    pub index: usize,
    /// 1-based file line number of the first line in `bytes`.
    pub first_line: usize,
    /// The raw lines, terminators included. Ends with `\n` unless it is the
    /// last chunk of an input without a trailing terminator.
    pub bytes: Bytes,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Split what is left in `store` into chunks of roughly `target_bytes`.
///
/// Each chunk is a raw block of `target_bytes` extended one byte at a time up
/// to and including the next `\n`, so no line ever straddles two chunks. A
/// line longer than `target_bytes` ends up alone in one oversized chunk.
/// Concatenating the returned chunks reproduces the unread bytes exactly.
///
/// # Errors
/// [`Error::Unsupported`] if `target_bytes` is zero.
pub fn split(store: &mut LineStore, target_bytes: usize) -> Result<Vec<Chunk>> {
    if target_bytes == 0 {
        return Err(Error::Unsupported("chunk size of zero bytes".into()));
    }
    let mut chunks = Vec::with_capacity(store.remaining() / target_bytes + 1);
    while !store.is_exhausted() {
        let start = store.position();
        let first_line = store.next_line_number();
        store.read_block(target_bytes);
        while !store.at_line_start() {
            match store.next_byte() {
                Some(LINE_TERMINATOR) | None => break,
                Some(_) => {}
            }
        }
        chunks.push(Chunk {
            index: chunks.len(),
            first_line,
            bytes: store.slice_from(start),
        });
    }
    tracing::debug!(
        chunks = chunks.len(),
        target_bytes,
        "split input into line-aligned chunks"
    );
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_str(input: &'static str, target: usize) -> Vec<Chunk> {
        let mut store = LineStore::from_bytes(input.as_bytes());
        split(&mut store, target).unwrap()
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(split_str("", 8).is_empty());
    }

    #[test]
    fn chunks_end_on_line_breaks() {
        let input = "aa,1\nbb,2\ncc,3\ndd,4\n";
        let chunks = split_str(input, 7);
        for c in &chunks {
            assert_eq!(c.bytes.last(), Some(&b'\n'));
        }
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.bytes.iter().copied()).collect();
        assert_eq!(joined, input.as_bytes());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].first_line, 1);
        assert_eq!(chunks[1].first_line, 3);
    }

    #[test]
    fn block_ending_on_terminator_is_not_extended() {
        let chunks = split_str("abc\ndef\n", 4);
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0].bytes[..], b"abc\n");
        assert_eq!(&chunks[1].bytes[..], b"def\n");
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn long_line_becomes_one_oversized_chunk() {
        let chunks = split_str("0123456789abcdef\nx\n", 4);
        assert_eq!(&chunks[0].bytes[..], b"0123456789abcdef\n");
        assert_eq!(&chunks[1].bytes[..], b"x\n");
    }

    #[test]
    fn last_line_without_terminator_is_kept() {
        let chunks = split_str("a\nbbbbbb", 2);
        let last = chunks.last().unwrap();
        assert_eq!(&last.bytes[..], b"bbbbbb");
        assert_eq!(last.first_line, 2);
    }

    #[test]
    fn zero_target_is_rejected() {
        let mut store = LineStore::from_bytes(&b"a\n"[..]);
        assert!(matches!(split(&mut store, 0), Err(Error::Unsupported(_))));
    }
}
