use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::codec::decoder;
use crate::error::{ArchiveError, PathContext};
use crate::extract::{peek_tar, write_raw};
use crate::options::{Container, Decompressed, ExtractOptions};
use crate::tar::unpack_file;
use crate::zip::{extract_single, unpack_zip};

fn detect(archive: &Path) -> Result<Container, ArchiveError> {
    Container::detect(archive).ok_or_else(|| ArchiveError::UnsupportedFormat(archive.to_path_buf()))
}

/// Unpacks an archive (`.zip`, `.tar.gz`, `.tgz`, `.tar.zst`, ...) into `dest_dir`.
///
/// Entry names are cleaned and must stay inside `dest_dir`. Directories are
/// created, files are created or truncated, and symlinks are recreated as
/// symlinks.
///
/// # Errors
///
/// Returns [`ArchiveError::PathTraversal`], before anything is written, when
/// an entry would land outside `dest_dir`, and
/// [`ArchiveError::UnsupportedEntry`] for unknown entry kinds when
/// permissions are preserved.
pub fn unpack(
    archive: impl AsRef<Path>, dest_dir: impl AsRef<Path>, options: &ExtractOptions,
) -> Result<(), ArchiveError> {
    let archive = archive.as_ref();
    let dest_dir = dest_dir.as_ref();
    let container = detect(archive)?;

    tracing::debug!(archive = %archive.display(), dest = %dest_dir.display(), "unpacking");
    fs::create_dir_all(dest_dir).at(dest_dir)?;

    match container {
        Container::Zip => unpack_zip(archive, dest_dir, options),
        Container::Stream(codec) => unpack_file(archive, dest_dir, codec, options),
    }
}

/// Decompresses a raw `.gz` / `.zst` stream to `dest_file`.
///
/// A `.zip` holding exactly one file is accepted too.
///
/// # Errors
///
/// Returns [`ArchiveError::NotSingleFile`] for a zip holding anything other
/// than one file, and [`ArchiveError::Io`] on read or write failures.
pub fn decompress_file(
    archive: impl AsRef<Path>, dest_file: impl AsRef<Path>,
) -> Result<(), ArchiveError> {
    let archive = archive.as_ref();
    let dest_file = dest_file.as_ref();

    match detect(archive)? {
        Container::Zip => extract_single(archive, dest_file),
        Container::Stream(codec) => {
            let file = File::open(archive).at(archive)?;
            write_raw(decoder(codec, BufReader::new(file)).at(archive)?, dest_file)
        }
    }
}

/// Decompresses `archive`, deciding from its content what `dest` is.
///
/// A tar-framed stream is unpacked into `dest` as a directory; a raw stream is
/// written to `dest` as a file. Zip files are always unpacked. Extraction uses
/// default [`ExtractOptions`].
///
/// A tar stream with no entries, such as a flat archive of an empty
/// directory, is only end-of-archive padding. It carries no header to
/// recognise, so it is written to `dest` as a file of zero blocks.
///
/// # Errors
///
/// As [`unpack`] and [`decompress_file`].
pub fn decompress(
    archive: impl AsRef<Path>, dest: impl AsRef<Path>,
) -> Result<Decompressed, ArchiveError> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();

    match detect(archive)? {
        Container::Zip => {
            unpack(archive, dest, &ExtractOptions::default())?;
            Ok(Decompressed::Unpacked)
        }
        Container::Stream(codec) => {
            let file = File::open(archive).at(archive)?;
            let stream = decoder(codec, BufReader::new(file)).at(archive)?;
            let (framed, stream) = peek_tar(stream, dest)?;
            if framed {
                drop(stream);
                tracing::debug!(dest = %dest.display(), "stream is tar framed, unpacking");
                fs::create_dir_all(dest).at(dest)?;
                unpack_file(archive, dest, codec, &ExtractOptions::default())?;
                Ok(Decompressed::Unpacked)
            } else {
                tracing::debug!(dest = %dest.display(), "stream is raw, writing single file");
                write_raw(stream, dest)?;
                Ok(Decompressed::File)
            }
        }
    }
}
