use std::path::Path;

use serde::Deserialize;

/// Volumes never exceed this many bytes of file content (10 GiB).
pub const MAX_VOLUME_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Default zstd compression level.
pub const DEFAULT_ZSTD_LEVEL: i32 = 5;

/// Archive container and compression written by [`compress`](crate::compress).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// tar framed, gzip compressed (`.tar.gz`).
    TarGz,
    /// tar framed, zstd compressed (`.tar.zst`).
    TarZst,
    /// zip container with deflate entries (`.zip`).
    Zip,
}

impl Format {
    /// Zip on Windows, tar+gzip elsewhere.
    #[must_use]
    pub const fn platform_default() -> Self {
        if cfg!(windows) { Self::Zip } else { Self::TarGz }
    }

    /// Extension of archive volumes, including the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => ".tar.gz",
            Self::TarZst => ".tar.zst",
            Self::Zip => ".zip",
        }
    }

    /// Extension used when a single file is compressed without tar framing.
    #[must_use]
    pub const fn raw_extension(self) -> &'static str {
        match self {
            Self::TarGz => ".gz",
            Self::TarZst => ".zst",
            Self::Zip => ".zip",
        }
    }

    pub(crate) const fn codec(self) -> Option<Codec> {
        match self {
            Self::TarGz => Some(Codec::Gzip),
            Self::TarZst => Some(Codec::Zstd),
            Self::Zip => None,
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// How entry names are derived from the source directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Names are relative to the source directory. Modes are normalized to
    /// 0644 for files and 0755 for directories.
    #[default]
    Flat,
    /// Names are prefixed with the source directory's own name and carry the
    /// original permission bits.
    BasePreserving,
}

/// Options for [`compress`](crate::compress).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompressOptions {
    /// Output format.
    pub format: Format,
    /// Entry naming.
    pub layout: Layout,
    /// Roll over to a new volume once this many bytes of file content have
    /// been written. `0` selects [`MAX_VOLUME_BYTES`]; larger values are capped.
    pub max_volume_bytes: u64,
    /// zstd level, clamped to 1..=22.
    pub level: i32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            format: Format::platform_default(),
            layout: Layout::Flat,
            max_volume_bytes: 0,
            level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl CompressOptions {
    /// Options for `format` with every other setting at its default.
    #[must_use]
    pub fn new(format: Format) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Sets the entry layout.
    #[must_use]
    pub const fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the volume size threshold.
    #[must_use]
    pub const fn max_volume_bytes(mut self, max: u64) -> Self {
        self.max_volume_bytes = max;
        self
    }

    /// Sets the zstd level.
    #[must_use]
    pub const fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub(crate) const fn volume_limit(&self) -> u64 {
        if self.max_volume_bytes == 0 || self.max_volume_bytes > MAX_VOLUME_BYTES {
            MAX_VOLUME_BYTES
        } else {
            self.max_volume_bytes
        }
    }
}

/// Options for [`unpack`](crate::unpack).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Apply the modes recorded in the archive and fail on entry kinds that
    /// cannot be reproduced. Otherwise files get 0644, directories 0755 and
    /// unknown kinds are skipped.
    pub preserve_permissions: bool,
}

/// Which branch [`decompress`](crate::decompress) took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decompressed {
    /// The input was an archive; entries were unpacked into the destination directory.
    Unpacked,
    /// The input was a raw stream; it was written to the destination file.
    File,
}

/// Compression applied to a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Codec {
    Gzip,
    Zstd,
}

/// Container detected from an archive's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Zip,
    Stream(Codec),
}

impl Container {
    /// Detects the container from the file name. Matching is case-insensitive.
    pub(crate) fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tgz") || name.ends_with(".gz") {
            Some(Self::Stream(Codec::Gzip))
        } else if name.ends_with(".tzst") || name.ends_with(".zst") {
            Some(Self::Stream(Codec::Zstd))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(Container::detect(Path::new("a/b.ZIP")), Some(Container::Zip));
        assert_eq!(Container::detect(Path::new("b.tar.gz")), Some(Container::Stream(Codec::Gzip)));
        assert_eq!(Container::detect(Path::new("b.tgz")), Some(Container::Stream(Codec::Gzip)));
        assert_eq!(Container::detect(Path::new("b.zst")), Some(Container::Stream(Codec::Zstd)));
        assert_eq!(Container::detect(Path::new("b.tar.zst")), Some(Container::Stream(Codec::Zstd)));
        assert_eq!(Container::detect(Path::new("b.rar")), None);
    }

    #[test]
    fn volume_limit_is_capped() {
        assert_eq!(CompressOptions::default().volume_limit(), MAX_VOLUME_BYTES);
        let huge = CompressOptions::default().max_volume_bytes(u64::MAX);
        assert_eq!(huge.volume_limit(), MAX_VOLUME_BYTES);
        assert_eq!(CompressOptions::default().max_volume_bytes(1024).volume_limit(), 1024);
    }

    #[test]
    fn deserialize_with_defaults() {
        let options: CompressOptions =
            serde_json::from_str(r#"{"format": "tar_zst", "layout": "base_preserving"}"#).unwrap();
        assert_eq!(options.format, Format::TarZst);
        assert_eq!(options.layout, Layout::BasePreserving);
        assert_eq!(options.level, DEFAULT_ZSTD_LEVEL);
    }
}
