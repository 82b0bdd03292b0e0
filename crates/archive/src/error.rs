use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while compressing or extracting archives.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// An I/O operation on `path` failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File or directory being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// An archive entry would be written outside the destination directory.
    ///
    /// Always fatal: extraction stops at the offending entry.
    #[error("entry escapes destination directory: {0}")]
    PathTraversal(String),

    /// The archive's extension names no supported format.
    #[error("unsupported archive format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// An entry kind that cannot be reproduced on disk.
    #[error("unsupported entry kind {kind} for {name}")]
    UnsupportedEntry {
        /// Entry name inside the archive.
        name: String,
        /// Entry kind as recorded by the archive.
        kind: String,
    },

    /// A raw decompression was requested for an archive holding more than one file.
    #[error("archive does not hold exactly one file: {}", .0.display())]
    NotSingleFile(PathBuf),

    /// The destination prefix has no file name component.
    #[error("invalid destination prefix: {}", .0.display())]
    InvalidDestination(PathBuf),

    /// The zip container is malformed.
    #[error("zip archive {}: {source}", path.display())]
    Zip {
        /// Archive being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: zip::result::ZipError,
    },
}

/// Attaches the path being processed to I/O and zip errors.
pub(crate) trait PathContext<T> {
    fn at(self, path: &Path) -> Result<T, ArchiveError>;
}

impl<T> PathContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T, ArchiveError> {
        self.map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T> PathContext<T> for zip::result::ZipResult<T> {
    fn at(self, path: &Path) -> Result<T, ArchiveError> {
        self.map_err(|source| ArchiveError::Zip {
            path: path.to_path_buf(),
            source,
        })
    }
}
