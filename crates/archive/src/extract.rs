//! Destination-side helpers shared by every extractor.

use std::cmp::Reverse;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};

use crate::error::{ArchiveError, PathContext};
use crate::options::{Decompressed, ExtractOptions};
use crate::walk::{DIR_MODE, FILE_MODE};

/// Size of a tar header block.
const BLOCK: usize = 512;

/// Resolves an entry name inside `dest`.
///
/// The name is cleaned lexically. Absolute names, and names whose `..`
/// segments climb above `dest`, are rejected. Returns `None` when the name
/// resolves to `dest` itself.
pub(crate) fn safe_join(dest: &Path, name: &str) -> Result<Option<PathBuf>, ArchiveError> {
    let mut parts = Vec::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(ArchiveError::PathTraversal(name.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ArchiveError::PathTraversal(name.to_string()));
            }
        }
    }

    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(parts.iter().fold(dest.to_path_buf(), |path, part| path.join(part))))
}

/// Fails if any existing ancestor of `target` below `dest` is a symlink, so
/// a previously extracted link cannot redirect writes outside `dest`.
pub(crate) fn check_ancestors(dest: &Path, target: &Path, name: &str) -> Result<(), ArchiveError> {
    let mut current = target.parent();
    while let Some(dir) = current {
        if dir == dest || !dir.starts_with(dest) {
            break;
        }
        if fs::symlink_metadata(dir).is_ok_and(|m| m.file_type().is_symlink()) {
            return Err(ArchiveError::PathTraversal(name.to_string()));
        }
        current = dir.parent();
    }
    Ok(())
}

/// Removes a symlink occupying `target` so the next write cannot follow it.
pub(crate) fn clear_link(target: &Path) -> Result<(), ArchiveError> {
    if fs::symlink_metadata(target).is_ok_and(|m| m.file_type().is_symlink()) {
        fs::remove_file(target).at(target)?;
    }
    Ok(())
}

/// Creates the parent directories of `target`.
pub(crate) fn create_parent(target: &Path) -> Result<(), ArchiveError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    Ok(())
}

/// Recorded directory modes, applied once every entry has been written.
///
/// Directories stay owner-writable while their contents are extracted and get
/// their final modes deepest first, so a read-only directory never blocks its
/// own children.
#[derive(Debug, Default)]
pub(crate) struct DirModes(Vec<(PathBuf, u32)>);

impl DirModes {
    /// Applies the recorded modes, children before parents.
    pub(crate) fn apply(mut self) -> Result<(), ArchiveError> {
        self.0.sort_by_key(|(path, _)| Reverse(path.components().count()));
        for (path, mode) in self.0 {
            set_mode(&path, mode)?;
        }
        Ok(())
    }
}

/// Creates a directory entry, deferring its recorded mode to `modes`.
pub(crate) fn create_dir(
    target: &Path, mode: Option<u32>, options: &ExtractOptions, modes: &mut DirModes,
) -> Result<(), ArchiveError> {
    clear_link(target)?;
    fs::create_dir_all(target).at(target)?;
    // an earlier extraction may have left it read-only
    set_mode(target, DIR_MODE)?;
    if options.preserve_permissions
        && let Some(mode) = mode.filter(|&m| m & 0o7777 != DIR_MODE)
    {
        modes.0.push((target.to_path_buf(), mode));
    }
    Ok(())
}

/// Creates (or replaces) a file entry and copies `body` into it.
///
/// Whatever occupies `target` is removed first, so neither a symlink nor a
/// read-only file from an earlier extraction gets in the way.
pub(crate) fn create_file(
    target: &Path, body: &mut impl Read, mode: Option<u32>, options: &ExtractOptions,
) -> Result<(), ArchiveError> {
    create_parent(target)?;
    if fs::symlink_metadata(target).is_ok_and(|m| !m.is_dir()) {
        fs::remove_file(target).at(target)?;
    }
    let mut file = File::create(target).at(target)?;
    io::copy(body, &mut file).at(target)?;
    let mode = if options.preserve_permissions { mode.unwrap_or(FILE_MODE) } else { FILE_MODE };
    set_mode(target, mode)
}

/// Recreates a symlink entry.
pub(crate) fn create_symlink(target: &Path, link: &Path) -> Result<(), ArchiveError> {
    create_parent(target)?;
    if fs::symlink_metadata(target).is_ok() {
        fs::remove_file(target).at(target)?;
    }
    symlink(link, target).at(target)
}

#[cfg(unix)]
fn set_mode(target: &Path, mode: u32) -> Result<(), ArchiveError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(target, fs::Permissions::from_mode(mode & 0o7777)).at(target)
}

#[cfg(not(unix))]
fn set_mode(target: &Path, mode: u32) -> Result<(), ArchiveError> {
    let mut permissions = fs::metadata(target).at(target)?.permissions();
    permissions.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(target, permissions).at(target)
}

#[cfg(unix)]
fn symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

#[cfg(windows)]
fn symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(link, target)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_link: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported on this platform"))
}

/// A stream whose first block has been read back into the front of it.
pub(crate) type Peeked<R> = io::Chain<Cursor<Vec<u8>>, R>;

/// Reads the first block of `stream` and reports whether it is a tar header.
///
/// The returned reader still yields the whole stream.
pub(crate) fn peek_tar<R: Read>(
    mut stream: R, dest: &Path,
) -> Result<(bool, Peeked<R>), ArchiveError> {
    let mut head = Vec::with_capacity(BLOCK);
    (&mut stream).take(BLOCK as u64).read_to_end(&mut head).at(dest)?;
    let framed = is_tar_header(&head);
    Ok((framed, Cursor::new(head).chain(stream)))
}

/// Unpacks a decompressed stream into `dest`, or writes it to `dest` as a
/// single file when it carries no tar framing.
///
/// The stream is consumed as it is read, so entry names are checked one at a
/// time: entries ahead of a traversing name are already on disk when
/// [`ArchiveError::PathTraversal`] is returned. Callers holding a file should
/// go through [`crate::tar::unpack_file`], which checks every name first.
pub(crate) fn sniff_into(stream: impl Read, dest: &Path) -> Result<Decompressed, ArchiveError> {
    let (framed, stream) = peek_tar(stream, dest)?;
    if framed {
        tracing::debug!(dest = %dest.display(), "stream is tar framed, unpacking");
        fs::create_dir_all(dest).at(dest)?;
        crate::tar::unpack_tar(stream, dest, &ExtractOptions::default())?;
        Ok(Decompressed::Unpacked)
    } else {
        tracing::debug!(dest = %dest.display(), "stream is raw, writing single file");
        write_raw(stream, dest)?;
        Ok(Decompressed::File)
    }
}

/// Writes a raw stream to `dest`.
pub(crate) fn write_raw(mut stream: impl Read, dest: &Path) -> Result<(), ArchiveError> {
    create_parent(dest)?;
    let mut file = File::create(dest).at(dest)?;
    io::copy(&mut stream, &mut file).at(dest)?;
    Ok(())
}

/// Whether `block` is a tar header: `ustar` magic and a valid checksum.
fn is_tar_header(block: &[u8]) -> bool {
    if block.len() < BLOCK || &block[257..262] != b"ustar" {
        return false;
    }
    let header = tar::Header::from_byte_slice(&block[..BLOCK]);
    let Ok(recorded) = header.cksum() else {
        return false;
    };
    let computed = block[..BLOCK]
        .iter()
        .enumerate()
        .map(|(i, b)| if (148..156).contains(&i) { u32::from(b' ') } else { u32::from(*b) })
        .sum::<u32>();
    recorded == computed
}
