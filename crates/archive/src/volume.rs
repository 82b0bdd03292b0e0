//! Volume naming and rollover.

use std::path::{Path, PathBuf};

use crate::error::ArchiveError;
use crate::walk::{Entry, EntryKind};

/// An open volume accepting archive entries.
pub(crate) trait Volume: Sized {
    /// Creates the volume file at `path`.
    fn create(path: &Path, level: i32) -> Result<Self, ArchiveError>;

    /// Appends one entry, returning the number of body bytes written.
    fn append(&mut self, entry: &Entry) -> Result<u64, ArchiveError>;

    /// Writes trailers and closes the volume file.
    fn finish(self) -> Result<(), ArchiveError>;
}

/// Names successive volumes `stem.ext`, `stem_1.ext`, `stem_2.ext`, ...
#[derive(Debug)]
pub(crate) struct VolumeSet {
    dir: PathBuf,
    stem: String,
    extension: &'static str,
    paths: Vec<PathBuf>,
}

impl VolumeSet {
    pub(crate) fn new(dir: &Path, stem: &str, extension: &'static str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            stem: stem.to_string(),
            extension,
            paths: Vec::new(),
        }
    }

    /// Path of the next volume.
    pub(crate) fn next_path(&mut self) -> PathBuf {
        let name = match self.paths.len() {
            0 => format!("{}{}", self.stem, self.extension),
            index => format!("{}_{index}{}", self.stem, self.extension),
        };
        let path = self.dir.join(name);
        self.paths.push(path.clone());
        path
    }

    pub(crate) fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}

/// Writes `entries` into as many volumes as `limit` requires.
///
/// The byte count covers file bodies only. It is checked after each whole
/// file, so a file is never split and a volume may exceed `limit` by up to
/// one file. The next volume is opened only when another entry follows.
pub(crate) fn write_volumes<V: Volume>(
    entries: &[Entry], volumes: &mut VolumeSet, limit: u64, level: i32,
) -> Result<(), ArchiveError> {
    let mut current = Some(V::create(&volumes.next_path(), level)?);
    let mut written = 0_u64;

    for entry in entries {
        let mut volume = match current.take() {
            Some(volume) => volume,
            None => {
                let path = volumes.next_path();
                tracing::debug!(volume = %path.display(), "rolling over to next volume");
                V::create(&path, level)?
            }
        };

        written += volume.append(entry)?;

        if entry.kind == EntryKind::File && written >= limit {
            volume.finish()?;
            written = 0;
        } else {
            current = Some(volume);
        }
    }

    if let Some(volume) = current {
        volume.finish()?;
    }
    Ok(())
}
