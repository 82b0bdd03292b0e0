//! # Archives
//!
//! Compresses a file or directory into tar+gzip, tar+zstd or zip archives and
//! extracts them again.
//!
//! Directory archives can be split into volumes: once the file content
//! written to a volume reaches [`CompressOptions::max_volume_bytes`], the next
//! entry starts `prefix_1.ext`, then `prefix_2.ext`, and so on. Each volume is
//! a complete archive, so extracting every volume into the same directory
//! reproduces the source tree.
//!
//! Extraction never writes outside the destination directory: entry names
//! are cleaned, absolute names and names climbing above the destination are
//! rejected, and writes through a symlinked parent are refused.
//!
//! ```ignore
//! use subkit_archive::{CompressOptions, ExtractOptions, Format, compress, unpack};
//!
//! let volumes = compress("data", "out/backup", &CompressOptions::new(Format::TarZst))?;
//! for volume in &volumes {
//!     unpack(volume, "restore", &ExtractOptions::default())?;
//! }
//! ```

#![forbid(unsafe_code)]

mod codec;
mod compress;
mod decompress;
mod error;
mod extract;
mod options;
mod tar;
pub mod transfer;
mod volume;
mod walk;
mod zip;

pub use self::compress::{compress, compress_auto};
pub use self::decompress::{decompress, decompress_file, unpack};
pub use self::error::ArchiveError;
pub use self::options::{
    CompressOptions, DEFAULT_ZSTD_LEVEL, Decompressed, ExtractOptions, Format, Layout,
    MAX_VOLUME_BYTES,
};
pub use self::transfer::{TransferError, compress_and_upload, download_and_decompress};
pub use self::walk::{Entry, EntryKind, walk};
