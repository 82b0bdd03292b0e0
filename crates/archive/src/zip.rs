//! zip containers.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ArchiveError, PathContext};
use crate::extract::{
    DirModes, check_ancestors, create_dir, create_file, create_symlink, safe_join, write_raw,
};
use crate::options::ExtractOptions;
use crate::volume::Volume;
use crate::walk::{Entry, EntryKind};

/// File type bits of a unix mode.
const S_IFMT: u32 = 0o170_000;
/// File type bits of a symlink.
const S_IFLNK: u32 = 0o120_000;

/// A zip volume with deflate-compressed entries.
pub(crate) struct ZipVolume {
    path: PathBuf,
    writer: ZipWriter<File>,
}

impl Volume for ZipVolume {
    fn create(path: &Path, _level: i32) -> Result<Self, ArchiveError> {
        tracing::debug!(volume = %path.display(), "creating zip volume");
        let file = File::create(path).at(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: ZipWriter::new(file),
        })
    }

    fn append(&mut self, entry: &Entry) -> Result<u64, ArchiveError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(entry.mode);

        match entry.kind {
            EntryKind::Dir => {
                self.writer.add_directory(entry.name.as_str(), options).at(&self.path)?;
                Ok(0)
            }
            EntryKind::Symlink => {
                let target = entry
                    .link_target
                    .as_deref()
                    .map(|t| t.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                self.writer.add_symlink(entry.name.as_str(), target, options).at(&self.path)?;
                Ok(0)
            }
            EntryKind::File => {
                let mut file = File::open(&entry.source).at(&entry.source)?;
                self.writer.start_file(entry.name.as_str(), options).at(&self.path)?;
                io::copy(&mut file, &mut self.writer).at(&entry.source)
            }
        }
    }

    fn finish(self) -> Result<(), ArchiveError> {
        self.writer.finish().at(&self.path)?;
        Ok(())
    }
}

fn open(archive: &Path) -> Result<ZipArchive<File>, ArchiveError> {
    let file = File::open(archive).at(archive)?;
    ZipArchive::new(file).at(archive)
}

/// Unpacks a zip file into `dest`, which must exist.
///
/// Every name is checked before anything is written. Recorded directory modes
/// are applied after the last entry.
pub(crate) fn unpack_zip(
    archive: &Path, dest: &Path, options: &ExtractOptions,
) -> Result<(), ArchiveError> {
    let mut zip = open(archive)?;
    let mut modes = DirModes::default();
    for name in zip.file_names() {
        safe_join(dest, name)?;
    }

    for index in 0..zip.len() {
        let mut file = zip.by_index(index).at(archive)?;
        let name = file.name().to_string();
        let Some(target) = safe_join(dest, &name)? else {
            continue;
        };
        check_ancestors(dest, &target, &name)?;

        let mode = file.unix_mode();
        if file.is_dir() {
            create_dir(&target, mode, options, &mut modes)?;
        } else if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            let mut link = String::new();
            file.read_to_string(&mut link).at(&target)?;
            create_symlink(&target, Path::new(&link))?;
        } else {
            create_file(&target, &mut file, mode, options)?;
        }
    }

    modes.apply()
}

/// Writes the only file of a zip to `dest`.
pub(crate) fn extract_single(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let mut zip = open(archive)?;
    let mut files = (0..zip.len()).filter(|&i| zip.by_index_raw(i).is_ok_and(|f| f.is_file()));
    let (Some(index), None) = (files.next(), files.next()) else {
        return Err(ArchiveError::NotSingleFile(archive.to_path_buf()));
    };

    let file = zip.by_index(index).at(archive)?;
    write_raw(file, dest)
}
