//! Deterministic traversal of a source directory.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::error::{ArchiveError, PathContext};
use crate::options::Layout;

pub(crate) const FILE_MODE: u32 = 0o644;
pub(crate) const DIR_MODE: u32 = 0o755;
pub(crate) const LINK_MODE: u32 = 0o777;

/// Kind of filesystem node an entry mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file; its bytes form the entry body.
    File,
    /// Directory; no body.
    Dir,
    /// Symbolic link; carries its target and no body.
    Symlink,
}

/// A filesystem node to be written into an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Location on disk.
    pub source: PathBuf,
    /// Name inside the archive, `/`-separated.
    pub name: String,
    /// Node kind.
    pub kind: EntryKind,
    /// Permission bits written to the archive.
    pub mode: u32,
    /// Body length; zero for directories and symlinks.
    pub size: u64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: u64,
    /// Link target, for symlinks.
    pub link_target: Option<PathBuf>,
}

/// Lists `root` depth-first with siblings in lexical order.
///
/// Directories precede their contents. Under [`Layout::Flat`] the root itself
/// is not listed; under [`Layout::BasePreserving`] it is, named after itself.
/// Symlinks are recorded, never followed.
pub fn walk(root: &Path, layout: Layout) -> Result<Vec<Entry>, ArchiveError> {
    let mut entries = Vec::new();

    let prefix = match layout {
        Layout::Flat => String::new(),
        Layout::BasePreserving => {
            let base = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| ArchiveError::InvalidDestination(root.to_path_buf()))?;
            let metadata = fs::symlink_metadata(root).at(root)?;
            entries.push(entry(root, base.clone(), &metadata, layout)?);
            base
        }
    };

    visit(root, &prefix, layout, &mut entries)?;
    Ok(entries)
}

/// Describes a single file source, named after itself.
pub(crate) fn single(path: &Path, layout: Layout) -> Result<Entry, ArchiveError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::InvalidDestination(path.to_path_buf()))?;
    let metadata = fs::metadata(path).at(path)?;
    entry(path, name, &metadata, layout)
}

fn visit(
    dir: &Path, prefix: &str, layout: Layout, entries: &mut Vec<Entry>,
) -> Result<(), ArchiveError> {
    let mut children = fs::read_dir(dir)
        .at(dir)?
        .map(|child| child.map(|c| c.path()))
        .collect::<Result<Vec<_>, _>>()
        .at(dir)?;
    children.sort();

    for path in children {
        let file_name =
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let name = if prefix.is_empty() { file_name } else { format!("{prefix}/{file_name}") };
        let metadata = fs::symlink_metadata(&path).at(&path)?;
        let current = entry(&path, name, &metadata, layout)?;

        if current.kind == EntryKind::Dir {
            let name = current.name.clone();
            entries.push(current);
            visit(&path, &name, layout, entries)?;
        } else {
            entries.push(current);
        }
    }

    Ok(())
}

fn entry(
    path: &Path, name: String, metadata: &Metadata, layout: Layout,
) -> Result<Entry, ArchiveError> {
    let file_type = metadata.file_type();
    let (kind, size, link_target) = if file_type.is_symlink() {
        (EntryKind::Symlink, 0, Some(fs::read_link(path).at(path)?))
    } else if file_type.is_dir() {
        (EntryKind::Dir, 0, None)
    } else {
        (EntryKind::File, metadata.len(), None)
    };

    let mode = match (layout, kind) {
        (Layout::BasePreserving, _) => permissions(metadata, kind),
        (Layout::Flat, EntryKind::File) => FILE_MODE,
        (Layout::Flat, EntryKind::Dir) => DIR_MODE,
        (Layout::Flat, EntryKind::Symlink) => LINK_MODE,
    };

    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());

    Ok(Entry {
        source: path.to_path_buf(),
        name,
        kind,
        mode,
        size,
        mtime,
        link_target,
    })
}

#[cfg(unix)]
fn permissions(metadata: &Metadata, _kind: EntryKind) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permissions(metadata: &Metadata, kind: EntryKind) -> u32 {
    match kind {
        EntryKind::Dir => DIR_MODE,
        EntryKind::Symlink => LINK_MODE,
        EntryKind::File if metadata.permissions().readonly() => 0o444,
        EntryKind::File => FILE_MODE,
    }
}
