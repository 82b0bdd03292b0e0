//! Streaming archives to and from an [`ObjectStore`].
//!
//! Compression runs on a blocking thread and feeds the upload through a
//! bounded channel, so at most a few chunks of the archive are held in memory
//! at once. Downloads work the same way in reverse.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use bytes::{Buf, Bytes, BytesMut};
use futures::StreamExt;
use subkit_blobstore::{ObjectInfo, ObjectStore};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::codec::{Encoder, decoder};
use crate::error::{ArchiveError, PathContext};
use crate::extract::sniff_into;
use crate::options::{Codec, DEFAULT_ZSTD_LEVEL, Decompressed, Layout};
use crate::tar::append_entry;
use crate::walk::walk;

/// Size of the chunks handed to the object store.
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the blocking side and the async side.
const CHANNEL_DEPTH: usize = 8;

const EXTENSION: &str = ".zst";

/// The stage of a transfer that failed.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Reading or compressing the source failed.
    #[error("compressing for upload: {0}")]
    Compress(#[source] ArchiveError),

    /// The object store rejected or aborted the upload.
    #[error("uploading: {0}")]
    Upload(#[source] anyhow::Error),

    /// The object could not be fetched or its body stream failed.
    #[error("downloading: {0}")]
    Download(#[source] anyhow::Error),

    /// The downloaded body could not be decompressed or written out.
    #[error("decompressing download: {0}")]
    Decompress(#[source] ArchiveError),
}

/// Compresses `source` with zstd and uploads it as `object_name`.
///
/// `.zst` is appended to the object name when missing. A directory is sent
/// as a tar stream that keeps the directory's own name; a single file is sent
/// as a raw zstd stream. `level` defaults to [`DEFAULT_ZSTD_LEVEL`].
///
/// # Errors
///
/// Returns [`TransferError::Compress`] when the source cannot be read, and
/// [`TransferError::Upload`] when the store fails the upload.
pub async fn compress_and_upload<S: ObjectStore + ?Sized>(
    store: &S, source: impl AsRef<Path>, object_name: &str, level: Option<i32>,
) -> Result<ObjectInfo, TransferError> {
    let source = source.as_ref().to_path_buf();
    let level = level.unwrap_or(DEFAULT_ZSTD_LEVEL);
    let mut name = object_name.to_string();
    if !name.ends_with(EXTENSION) {
        name.push_str(EXTENSION);
    }

    tracing::debug!(source = %source.display(), object = %name, level, "streaming upload");

    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    let producer = tokio::task::spawn_blocking({
        let source = source.clone();
        move || {
            let failures = tx.clone();
            let result = produce(&source, ChannelWriter::new(tx), level);
            if let Err(e) = &result {
                // fail the upload instead of letting it store a truncated body
                let _ = failures.blocking_send(Err(anyhow::anyhow!("compression failed: {e}")));
            }
            result
        }
    });

    let uploaded = store.put_object(name, ReceiverStream::new(rx).boxed(), None).await;
    let produced = producer.await.map_err(io::Error::other).at(&source).and_then(|r| r);

    match (uploaded, produced) {
        (Ok(info), Ok(())) => {
            tracing::debug!(object = %info.name, size = info.size, "upload complete");
            Ok(info)
        }
        (Err(e), Err(produced)) if is_broken_pipe(&produced) => Err(TransferError::Upload(e)),
        (_, Err(produced)) => Err(TransferError::Compress(produced)),
        (Err(e), Ok(())) => Err(TransferError::Upload(e)),
    }
}

/// Downloads `object_name` and decompresses it into `dest`.
///
/// A tar-framed body is unpacked into `dest` as a directory; anything else is
/// written to `dest` as a single file. The body is extracted while it
/// downloads, so entry names are checked one at a time and entries ahead of a
/// traversing name may already be written when the call fails.
///
/// # Errors
///
/// Returns [`TransferError::Download`] when the object cannot be fetched or
/// its body fails mid-stream, and [`TransferError::Decompress`] when the body
/// is not valid zstd or cannot be written out.
pub async fn download_and_decompress<S: ObjectStore + ?Sized>(
    store: &S, object_name: &str, dest: impl AsRef<Path>,
) -> Result<Decompressed, TransferError> {
    let dest = dest.as_ref().to_path_buf();
    tracing::debug!(object = object_name, dest = %dest.display(), "streaming download");

    let mut body =
        store.get_object(object_name.to_string()).await.map_err(TransferError::Download)?;

    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    let consumer = tokio::task::spawn_blocking({
        let dest = dest.clone();
        move || -> Result<Decompressed, ArchiveError> {
            let stream = decoder(Codec::Zstd, ChannelReader::new(rx)).at(&dest)?;
            sniff_into(stream, &dest)
        }
    });

    let mut failure = None;
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                if tx.send(Ok(bytes)).await.is_err() {
                    // the consumer stopped early and holds the reason
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(io::Error::other("download interrupted"))).await;
                failure = Some(e);
                break;
            }
        }
    }
    drop(tx);

    let consumed = consumer.await.map_err(io::Error::other).at(&dest).and_then(|r| r);
    if let Some(e) = failure {
        return Err(TransferError::Download(e));
    }
    consumed.map_err(TransferError::Decompress)
}

fn produce(source: &Path, writer: ChannelWriter, level: i32) -> Result<(), ArchiveError> {
    let metadata = fs::metadata(source).at(source)?;
    let mut encoder = Encoder::new(Codec::Zstd, writer, level).at(source)?;

    if metadata.is_dir() {
        let entries = walk(source, Layout::BasePreserving)?;
        let mut builder = tar::Builder::new(&mut encoder);
        builder.follow_symlinks(false);
        for entry in &entries {
            append_entry(&mut builder, entry)?;
        }
        builder.into_inner().at(source)?;
    } else {
        let mut input = File::open(source).at(source)?;
        io::copy(&mut input, &mut encoder).at(source)?;
    }

    encoder.finish().at(source)?.flush().at(source)
}

fn is_broken_pipe(error: &ArchiveError) -> bool {
    matches!(error, ArchiveError::Io { source, .. } if source.kind() == io::ErrorKind::BrokenPipe)
}

/// Sends written bytes down a channel in [`CHUNK_SIZE`] pieces.
struct ChannelWriter {
    tx: mpsc::Sender<anyhow::Result<Bytes>>,
    buf: BytesMut,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<anyhow::Result<Bytes>>) -> Self {
        Self {
            tx,
            buf: BytesMut::with_capacity(CHUNK_SIZE),
        }
    }

    fn send(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = self.buf.split().freeze();
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "upload stream closed"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        if self.buf.len() >= CHUNK_SIZE {
            self.send()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send()
    }
}

/// Reads bytes received from a channel.
struct ChannelReader {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChannelReader {
    const fn new(rx: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            rx,
            current: Bytes::new(),
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.current.is_empty() {
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}
