//! gzip and zstd stream adapters.

use std::io::{self, Read, Write};
use std::thread;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::options::{Codec, DEFAULT_ZSTD_LEVEL};

/// A compressing writer for either codec.
pub(crate) enum Encoder<W: Write> {
    Gzip(GzEncoder<W>),
    Zstd(zstd::Encoder<'static, W>),
}

impl<W: Write> Encoder<W> {
    /// Wraps `inner`. `level` only applies to zstd and is clamped to 1..=22.
    pub(crate) fn new(codec: Codec, inner: W, level: i32) -> io::Result<Self> {
        match codec {
            Codec::Gzip => Ok(Self::Gzip(GzEncoder::new(inner, Compression::default()))),
            Codec::Zstd => {
                let level = if (1..=22).contains(&level) {
                    level
                } else {
                    tracing::debug!(level, "zstd level out of range, using {DEFAULT_ZSTD_LEVEL}");
                    DEFAULT_ZSTD_LEVEL
                };
                let mut encoder = zstd::Encoder::new(inner, level)?;
                encoder.multithread(workers())?;
                Ok(Self::Zstd(encoder))
            }
        }
    }

    /// Writes the stream trailer and returns the inner writer.
    pub(crate) fn finish(self) -> io::Result<W> {
        match self {
            Self::Gzip(encoder) => encoder.finish(),
            Self::Zstd(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(encoder) => encoder.write(buf),
            Self::Zstd(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(encoder) => encoder.flush(),
            Self::Zstd(encoder) => encoder.flush(),
        }
    }
}

/// Wraps `inner` in a decompressing reader.
pub(crate) fn decoder<'a, R: Read + 'a>(codec: Codec, inner: R) -> io::Result<Box<dyn Read + 'a>> {
    Ok(match codec {
        Codec::Gzip => Box::new(MultiGzDecoder::new(inner)),
        Codec::Zstd => Box::new(zstd::Decoder::new(inner)?),
    })
}

/// One zstd worker per available processor.
fn workers() -> u32 {
    thread::available_parallelism().map_or(1, |n| u32::try_from(n.get()).unwrap_or(u32::MAX))
}
