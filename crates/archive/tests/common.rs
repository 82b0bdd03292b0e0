//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A filesystem node as captured by [`snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(Vec<u8>),
    Dir,
    Link(PathBuf),
}

/// Builds the tree used across tests under `root/data` and returns its path.
///
/// ```text
/// data/
///   a.txt
///   bin/run.sh      (0755 on unix)
///   empty/
///   link -> a.txt   (unix only)
///   nested/deep/b.txt
/// ```
pub fn fixture(root: &Path) -> PathBuf {
    subkit::telemetry::init("subkit_archive=debug");

    let data = root.join("data");
    fs::create_dir_all(data.join("bin")).unwrap();
    fs::create_dir_all(data.join("empty")).unwrap();
    fs::create_dir_all(data.join("nested/deep")).unwrap();
    fs::write(data.join("a.txt"), "alpha").unwrap();
    fs::write(data.join("bin/run.sh"), "#!/bin/sh\necho hi\n").unwrap();
    fs::write(data.join("nested/deep/b.txt"), "bravo".repeat(100)).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(data.join("bin/run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        std::os::unix::fs::symlink("a.txt", data.join("link")).unwrap();
    }

    data
}

/// Captures every node below `root`, keyed by `/`-separated relative name.
pub fn snapshot(root: &Path) -> BTreeMap<String, Node> {
    let mut nodes = BTreeMap::new();
    visit(root, root, &mut nodes);
    nodes
}

fn visit(root: &Path, dir: &Path, nodes: &mut BTreeMap<String, Node>) {
    for child in fs::read_dir(dir).unwrap() {
        let path = child.unwrap().path();
        let name = path
            .strip_prefix(root)
            .unwrap()
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let file_type = fs::symlink_metadata(&path).unwrap().file_type();

        if file_type.is_symlink() {
            nodes.insert(name, Node::Link(fs::read_link(&path).unwrap()));
        } else if file_type.is_dir() {
            nodes.insert(name, Node::Dir);
            visit(root, &path, nodes);
        } else {
            nodes.insert(name, Node::File(fs::read(&path).unwrap()));
        }
    }
}

/// Permission bits of `path`.
#[cfg(unix)]
pub fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

/// Writes a tar stream with a single entry whose name is set verbatim,
/// bypassing the builder's path validation.
pub fn tar_with_raw_name(name: &str, body: &[u8]) -> Vec<u8> {
    tar_with_raw_names(&[(name, body)])
}

/// Writes a tar stream of regular files whose names are set verbatim, in order.
pub fn tar_with_raw_names(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, body) in entries {
        let mut header = tar::Header::new_gnu();
        let field = &mut header.as_gnu_mut().unwrap().name;
        field[..name.len()].copy_from_slice(name.as_bytes());
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, *body).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Sets the permission bits of `path`.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}
