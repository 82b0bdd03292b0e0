//! tar framing over gzip or zstd.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tar::{Archive, Builder, EntryType, Header};

use crate::codec::Encoder;
use crate::error::{ArchiveError, PathContext};
use crate::extract::{
    DirModes, check_ancestors, create_dir, create_file, create_symlink, safe_join,
};
use crate::options::{Codec, ExtractOptions};
use crate::volume::Volume;
use crate::walk::{Entry, EntryKind};

/// Appends one entry to a tar stream, returning the body bytes written.
pub(crate) fn append_entry<W: Write>(
    builder: &mut Builder<W>, entry: &Entry,
) -> Result<u64, ArchiveError> {
    let mut header = Header::new_gnu();
    header.set_mode(entry.mode);
    header.set_mtime(entry.mtime);

    match entry.kind {
        EntryKind::Dir => {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            builder.append_data(&mut header, &entry.name, io::empty()).at(&entry.source)?;
            Ok(0)
        }
        EntryKind::Symlink => {
            let target = entry.link_target.as_deref().unwrap_or_else(|| Path::new(""));
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            builder.append_link(&mut header, &entry.name, target).at(&entry.source)?;
            Ok(0)
        }
        EntryKind::File => {
            let file = File::open(&entry.source).at(&entry.source)?;
            let size = file.metadata().at(&entry.source)?.len();
            header.set_entry_type(EntryType::Regular);
            header.set_size(size);
            builder.append_data(&mut header, &entry.name, file).at(&entry.source)?;
            Ok(size)
        }
    }
}

/// A tar volume: file, buffered, compressed, framed.
pub(crate) struct TarVolume<const ZSTD: bool> {
    path: PathBuf,
    builder: Builder<Encoder<BufWriter<File>>>,
}

/// gzip-compressed tar volume.
pub(crate) type TarGzVolume = TarVolume<false>;
/// zstd-compressed tar volume.
pub(crate) type TarZstVolume = TarVolume<true>;

impl<const ZSTD: bool> Volume for TarVolume<ZSTD> {
    fn create(path: &Path, level: i32) -> Result<Self, ArchiveError> {
        tracing::debug!(volume = %path.display(), "creating tar volume");
        let codec = if ZSTD { Codec::Zstd } else { Codec::Gzip };
        let file = File::create(path).at(path)?;
        let encoder = Encoder::new(codec, BufWriter::new(file), level).at(path)?;
        let mut builder = Builder::new(encoder);
        builder.follow_symlinks(false);
        Ok(Self {
            path: path.to_path_buf(),
            builder,
        })
    }

    fn append(&mut self, entry: &Entry) -> Result<u64, ArchiveError> {
        append_entry(&mut self.builder, entry)
    }

    fn finish(self) -> Result<(), ArchiveError> {
        let encoder = self.builder.into_inner().at(&self.path)?;
        let mut writer = encoder.finish().at(&self.path)?;
        writer.flush().at(&self.path)
    }
}

/// Compresses a single file as a raw stream.
pub(crate) fn compress_raw(
    source: &Path, dest: &Path, codec: Codec, level: i32,
) -> Result<(), ArchiveError> {
    let mut input = File::open(source).at(source)?;
    let output = File::create(dest).at(dest)?;
    let mut encoder = Encoder::new(codec, BufWriter::new(output), level).at(dest)?;
    io::copy(&mut input, &mut encoder).at(source)?;
    encoder.finish().at(dest)?.flush().at(dest)
}

/// Unpacks a tar stream into `dest`, which must exist.
///
/// Names are checked as entries arrive. Recorded directory modes are applied
/// after the last entry.
pub(crate) fn unpack_tar(
    stream: impl Read, dest: &Path, options: &ExtractOptions,
) -> Result<(), ArchiveError> {
    let mut archive = Archive::new(stream);
    let mut modes = DirModes::default();

    for entry in archive.entries().at(dest)? {
        let mut entry = entry.at(dest)?;
        let name = entry.path().at(dest)?.to_string_lossy().into_owned();
        let Some(target) = safe_join(dest, &name)? else {
            continue;
        };
        check_ancestors(dest, &target, &name)?;

        let mode = entry.header().mode().ok();
        match entry.header().entry_type() {
            EntryType::Directory => create_dir(&target, mode, options, &mut modes)?,
            EntryType::Regular | EntryType::Continuous => {
                create_file(&target, &mut entry, mode, options)?;
            }
            // metadata records, already applied by the reader
            EntryType::XGlobalHeader
            | EntryType::XHeader
            | EntryType::GNULongName
            | EntryType::GNULongLink => {}
            EntryType::Symlink => {
                let link = entry
                    .link_name()
                    .at(&target)?
                    .ok_or_else(|| ArchiveError::UnsupportedEntry {
                        name: name.clone(),
                        kind: "symlink without target".to_string(),
                    })?
                    .into_owned();
                create_symlink(&target, &link)?;
            }
            other if options.preserve_permissions => {
                return Err(ArchiveError::UnsupportedEntry {
                    name,
                    kind: format!("{other:?}"),
                });
            }
            other => tracing::debug!(entry = %name, kind = ?other, "skipping unsupported entry"),
        }
    }

    modes.apply()
}

/// Fails with [`ArchiveError::PathTraversal`] if any entry of a tar stream
/// would land outside `dest`. Bodies are skipped, nothing is written.
pub(crate) fn check_names(stream: impl Read, dest: &Path) -> Result<(), ArchiveError> {
    let mut archive = Archive::new(stream);
    for entry in archive.entries().at(dest)? {
        let entry = entry.at(dest)?;
        let name = entry.path().at(dest)?.to_string_lossy().into_owned();
        safe_join(dest, &name)?;
    }
    Ok(())
}

/// Opens a compressed tar file and unpacks it.
///
/// The file is decoded twice: once to check every name, then to extract. A
/// traversing entry therefore fails the call before anything is written.
pub(crate) fn unpack_file(
    archive: &Path, dest: &Path, codec: Codec, options: &ExtractOptions,
) -> Result<(), ArchiveError> {
    check_names(open_decoded(archive, codec)?, dest)?;
    unpack_tar(open_decoded(archive, codec)?, dest, options)
}

fn open_decoded(archive: &Path, codec: Codec) -> Result<Box<dyn Read>, ArchiveError> {
    let file = File::open(archive).at(archive)?;
    crate::codec::decoder(codec, io::BufReader::new(file)).at(archive)
}
