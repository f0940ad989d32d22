//! Transparent compression for input and output files.
//!
//! Reads pick a codec from the file extension first and fall back to the
//! magic bytes at the start of the stream; writes pick one from the extension
//! only. Files with no recognised codec pass through unchanged.
//!
//! Built-in codecs, each behind its own feature flag:
//! - **Gzip** (`.gz`, `.gzip`) via `flate2` (`compression-gzip`)
//! - **Zstd** (`.zst`, `.zstd`) via `zstd` (`compression-zstd`)
//! - **Bzip2** (`.bz2`, `.bzip2`) via `bzip2` (`compression-bzip2`)
//! - **Xz** (`.xz`) via `xz2` (`compression-xz`)
//!
//! Compression only wraps the byte stream. The parallel reader always works
//! on the fully decompressed bytes, so chunking is unaffected.
//!
//! ```no_run
//! use ironcsv::io::compression::{auto_detect_reader, auto_detect_writer};
//! use std::fs::File;
//! # fn main() -> std::io::Result<()> {
//! let reader = auto_detect_reader(File::open("people.csv.gz")?, "people.csv.gz")?;
//! let writer = auto_detect_writer(File::create("people.csv.zst")?, "people.csv.zst")?;
//! # Ok(())
//! # }
//! ```

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

type Registry = RwLock<Vec<Arc<dyn CompressionCodec>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn builtin_codecs() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Arc::new(ZstdCodec),
        #[cfg(feature = "compression-bzip2")]
        Arc::new(Bzip2Codec),
        #[cfg(feature = "compression-xz")]
        Arc::new(XzCodec),
    ]
}

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| RwLock::new(builtin_codecs()))
}

fn codecs() -> Vec<Arc<dyn CompressionCodec>> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Register a custom codec. Later registrations are consulted after the
/// built-in ones.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(codec);
}

/// A compression algorithm that can wrap readers and writers.
pub trait CompressionCodec: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercase extensions including the leading dot, e.g. `&[".gz"]`.
    fn extensions(&self) -> &[&str];

    /// Signature at the start of a compressed stream, if the format has one.
    fn magic_bytes(&self) -> Option<&[u8]>;

    fn wrap_reader(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>>;

    fn wrap_writer(&self, writer: Box<dyn Write>) -> io::Result<Box<dyn FinishWrite>>;
}

/// A writer that must be finished explicitly.
///
/// Compressors write their trailer in `finish`; dropping one instead would
/// lose any error from that last write. `finish` also flushes everything
/// underneath.
pub trait FinishWrite: Write {
    fn finish(self: Box<Self>) -> io::Result<()>;
}

impl<W: Write> FinishWrite for BufWriter<W> {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

/// Name of the codec the extension of `path` selects, if any.
pub fn codec_name_for(path: impl AsRef<Path>) -> Option<String> {
    by_extension(path.as_ref()).map(|c| c.name().to_string())
}

fn by_extension(path: &Path) -> Option<Arc<dyn CompressionCodec>> {
    let name = path.to_string_lossy().to_lowercase();
    codecs()
        .into_iter()
        .find(|c| c.extensions().iter().any(|ext| name.ends_with(ext)))
}

fn by_magic<R: BufRead>(reader: &mut R) -> io::Result<Option<Arc<dyn CompressionCodec>>> {
    let head = reader.fill_buf()?;
    if head.is_empty() {
        return Ok(None);
    }
    Ok(codecs()
        .into_iter()
        .find(|c| c.magic_bytes().is_some_and(|m| head.starts_with(m))))
}

/// Wrap `reader` with a decompressor chosen from `path_hint` or the stream's
/// magic bytes; otherwise return it buffered.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> io::Result<Box<dyn Read>> {
    if let Some(codec) = by_extension(path_hint.as_ref()) {
        tracing::debug!(codec = codec.name(), "decompressing by extension");
        return codec.wrap_reader(Box::new(reader));
    }
    let mut buffered = BufReader::new(reader);
    if let Some(codec) = by_magic(&mut buffered)? {
        tracing::debug!(codec = codec.name(), "decompressing by magic bytes");
        return codec.wrap_reader(Box::new(buffered));
    }
    Ok(Box::new(buffered))
}

/// Wrap `writer` with a compressor chosen from the extension of `path_hint`;
/// otherwise return it buffered. Call [`FinishWrite::finish`] when done.
pub fn auto_detect_writer<W: Write + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> io::Result<Box<dyn FinishWrite>> {
    match by_extension(path_hint.as_ref()) {
        Some(codec) => codec.wrap_writer(Box::new(BufWriter::new(writer))),
        None => Ok(Box::new(BufWriter::new(writer))),
    }
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(flate2::read::MultiGzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(flate2::write::GzEncoder::new(
            writer,
            flate2::Compression::default(),
        )))
    }
}

#[cfg(feature = "compression-gzip")]
impl FinishWrite for flate2::write::GzEncoder<Box<dyn Write>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        flate2::write::GzEncoder::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(zstd::stream::read::Decoder::new(reader)?))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(zstd::stream::write::Encoder::new(writer, 3)?))
    }
}

#[cfg(feature = "compression-zstd")]
impl FinishWrite for zstd::stream::write::Encoder<'static, Box<dyn Write>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        zstd::stream::write::Encoder::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn extensions(&self) -> &[&str] {
        &[".bz2", ".bzip2"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(b"BZh")
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(bzip2::write::BzEncoder::new(
            writer,
            bzip2::Compression::default(),
        )))
    }
}

#[cfg(feature = "compression-bzip2")]
impl FinishWrite for bzip2::write::BzEncoder<Box<dyn Write>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        bzip2::write::BzEncoder::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-xz")]
struct XzCodec;

#[cfg(feature = "compression-xz")]
impl CompressionCodec for XzCodec {
    fn name(&self) -> &str {
        "xz"
    }

    fn extensions(&self) -> &[&str] {
        &[".xz"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0xfd, b'7', b'z', b'X', b'Z', 0x00])
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(xz2::read::XzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(xz2::write::XzEncoder::new(writer, 6)))
    }
}

#[cfg(feature = "compression-xz")]
impl FinishWrite for xz2::write::XzEncoder<Box<dyn Write>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        xz2::write::XzEncoder::finish(*self)?.flush()
    }
}
