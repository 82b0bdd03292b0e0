use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, PathContext};
use crate::options::{CompressOptions, Format, Layout};
use crate::tar::{TarGzVolume, TarZstVolume, compress_raw};
use crate::volume::{Volume, VolumeSet, write_volumes};
use crate::walk::{single, walk};
use crate::zip::ZipVolume;

/// Compresses `source` into volumes named after `dest_prefix`.
///
/// A directory source is walked depth-first and written as `prefix.ext`,
/// `prefix_1.ext`, ... with a new volume started once the file content
/// written to the current one reaches the volume limit. A single-file source
/// is written as one raw `.gz` / `.zst` stream (or a one-entry `.zip`).
///
/// The destination directory is created first. On error, volumes written so
/// far are left in place. Returns the volumes written, in order.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidDestination`] when `dest_prefix` has no file
/// name, and [`ArchiveError::Io`] / [`ArchiveError::Zip`] on the first failed
/// read or write.
pub fn compress(
    source: impl AsRef<Path>, dest_prefix: impl AsRef<Path>, options: &CompressOptions,
) -> Result<Vec<PathBuf>, ArchiveError> {
    let source = source.as_ref();
    let dest_prefix = dest_prefix.as_ref();

    let stem = dest_prefix
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::InvalidDestination(dest_prefix.to_path_buf()))?;
    let dir = dest_prefix.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(dir).at(dir)?;

    if !fs::metadata(source).at(source)?.is_dir() {
        let path = dir.join(format!("{stem}{}", options.format.raw_extension()));
        tracing::debug!(source = %source.display(), dest = %path.display(), "compressing file");

        match options.format.codec() {
            Some(codec) => compress_raw(source, &path, codec, options.level)?,
            None => {
                let mut volume = ZipVolume::create(&path, options.level)?;
                volume.append(&single(source, options.layout)?)?;
                volume.finish()?;
            }
        }
        return Ok(vec![path]);
    }

    let entries = walk(source, options.layout)?;
    let mut volumes = VolumeSet::new(dir, &stem, options.format.extension());
    let limit = options.volume_limit();

    let level = options.level;
    match options.format {
        Format::TarGz => write_volumes::<TarGzVolume>(&entries, &mut volumes, limit, level),
        Format::TarZst => write_volumes::<TarZstVolume>(&entries, &mut volumes, limit, level),
        Format::Zip => write_volumes::<ZipVolume>(&entries, &mut volumes, limit, level),
    }?;

    let paths = volumes.into_paths();
    tracing::debug!(
        source = %source.display(),
        entries = entries.len(),
        volumes = paths.len(),
        "compressed directory"
    );
    Ok(paths)
}

/// Compresses `source` with the platform's default format, keeping the
/// source directory's name and permission bits in the archive.
///
/// # Errors
///
/// As [`compress`].
pub fn compress_auto(
    source: impl AsRef<Path>, dest_prefix: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ArchiveError> {
    let options = CompressOptions::new(Format::platform_default()).layout(Layout::BasePreserving);
    compress(source, dest_prefix, &options)
}
