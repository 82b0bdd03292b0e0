//! Integration tests for compression and the matching extraction paths.

#![allow(missing_docs)]

mod common;

use std::fs;

use common::{fixture, snapshot};
use subkit_archive::{
    ArchiveError, CompressOptions, Decompressed, ExtractOptions, Format, Layout, compress,
    compress_auto, decompress, decompress_file, unpack,
};
use tempfile::TempDir;

#[test]
fn round_trip_every_format() {
    for format in [Format::TarGz, Format::TarZst, Format::Zip] {
        let tmp = TempDir::new().unwrap();
        let data = fixture(tmp.path());
        let restore = tmp.path().join("restore");

        let volumes =
            compress(&data, tmp.path().join("out/backup"), &CompressOptions::new(format)).unwrap();
        assert_eq!(volumes, vec![tmp.path().join(format!("out/backup{}", format.extension()))]);

        unpack(&volumes[0], &restore, &ExtractOptions::default()).unwrap();
        assert_eq!(snapshot(&restore), snapshot(&data), "{format:?}");
    }
}

#[test]
fn flat_layout_has_no_root_entry() {
    let tmp = TempDir::new().unwrap();
    let data = fixture(tmp.path());
    let restore = tmp.path().join("restore");

    let volumes = compress(&data, tmp.path().join("flat"), &CompressOptions::new(Format::TarGz))
        .unwrap();
    unpack(&volumes[0], &restore, &ExtractOptions::default()).unwrap();

    assert!(restore.join("a.txt").is_file());
    assert!(!restore.join("data").exists());
}

#[test]
fn compress_auto_keeps_base_directory() {
    let tmp = TempDir::new().unwrap();
    let data = fixture(tmp.path());
    let restore = tmp.path().join("restore");

    let volumes = compress_auto(&data, tmp.path().join("auto")).unwrap();
    assert_eq!(volumes.len(), 1);
    assert!(volumes[0].to_string_lossy().ends_with(Format::platform_default().extension()));

    unpack(&volumes[0], &restore, &ExtractOptions::default()).unwrap();
    assert_eq!(snapshot(&restore.join("data")), snapshot(&data));
}

#[cfg(unix)]
#[test]
fn base_preserving_restores_modes() {
    let tmp = TempDir::new().unwrap();
    let data = fixture(tmp.path());
    let restore = tmp.path().join("restore");

    let options = CompressOptions::new(Format::TarZst).layout(Layout::BasePreserving);
    let volumes = compress(&data, tmp.path().join("modes"), &options).unwrap();
    let extract = ExtractOptions {
        preserve_permissions: true,
    };
    unpack(&volumes[0], &restore, &extract).unwrap();

    assert_eq!(common::mode(&restore.join("data/bin/run.sh")), 0o755);
    assert_eq!(common::mode(&restore.join("data/a.txt")), common::mode(&data.join("a.txt")));
}

#[cfg(unix)]
#[test]
fn read_only_directory_round_trip() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    let read_only = data.join("ro");
    fs::create_dir_all(&read_only).unwrap();
    fs::write(read_only.join("file.txt"), "locked").unwrap();
    common::set_mode(&read_only.join("file.txt"), 0o444);
    common::set_mode(&read_only, 0o555);

    let extract = ExtractOptions {
        preserve_permissions: true,
    };
    let restore = tmp.path().join("restore");
    for format in [Format::TarGz, Format::Zip] {
        let options = CompressOptions::new(format).layout(Layout::BasePreserving);
        let volumes = compress(&data, tmp.path().join("ro"), &options).unwrap();

        // a second pass lands on the read-only tree left by the first
        for _ in 0..2 {
            unpack(&volumes[0], &restore, &extract).unwrap();
            let restored = restore.join("data/ro");
            assert_eq!(fs::read_to_string(restored.join("file.txt")).unwrap(), "locked");
            assert_eq!(common::mode(&restored), 0o555);
            assert_eq!(common::mode(&restored.join("file.txt")), 0o444);
        }
    }

    // let the temporary directory clean up after itself
    common::set_mode(&read_only, 0o755);
    common::set_mode(&restore.join("data/ro"), 0o755);
}

#[cfg(unix)]
#[test]
fn flat_layout_normalizes_modes() {
    let tmp = TempDir::new().unwrap();
    let data = fixture(tmp.path());
    let restore = tmp.path().join("restore");

    let volumes = compress(&data, tmp.path().join("flat"), &CompressOptions::new(Format::Zip))
        .unwrap();
    let extract = ExtractOptions {
        preserve_permissions: true,
    };
    unpack(&volumes[0], &restore, &extract).unwrap();

    assert_eq!(common::mode(&restore.join("bin/run.sh")), 0o644);
    assert_eq!(common::mode(&restore.join("nested")), 0o755);
}

#[test]
fn repeated_compression_is_stable() {
    let tmp = TempDir::new().unwrap();
    let data = fixture(tmp.path());
    let prefix = tmp.path().join("out/again");
    let options = CompressOptions::new(Format::TarGz);

    let first = compress(&data, &prefix, &options).unwrap();
    let second = compress(&data, &prefix, &options).unwrap();
    assert_eq!(first, second);

    let restore = tmp.path().join("restore");
    unpack(&second[0], &restore, &ExtractOptions::default()).unwrap();
    assert_eq!(snapshot(&restore), snapshot(&data));
}

#[test]
fn volumes_roll_over_after_limit() {
    for format in [Format::TarGz, Format::TarZst, Format::Zip] {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("big");
        fs::create_dir_all(&data).unwrap();
        for (i, byte) in [b'x', b'y', b'z'].into_iter().enumerate() {
            fs::write(data.join(format!("f{i}.bin")), vec![byte; 4096]).unwrap();
        }

        let options = CompressOptions::new(format).max_volume_bytes(5000);
        let volumes = compress(&data, tmp.path().join("split"), &options).unwrap();
        let ext = format.extension();
        assert_eq!(
            volumes,
            vec![
                tmp.path().join(format!("split{ext}")),
                tmp.path().join(format!("split_1{ext}")),
            ],
            "{format:?}"
        );

        let restore = tmp.path().join("restore");
        for volume in &volumes {
            unpack(volume, &restore, &ExtractOptions::default()).unwrap();
        }
        assert_eq!(snapshot(&restore), snapshot(&data), "{format:?}");
    }
}

#[test]
fn single_file_is_written_raw() {
    for (format, ext) in [(Format::TarGz, ".gz"), (Format::TarZst, ".zst"), (Format::Zip, ".zip")] {
        let tmp = TempDir::new().unwrap();
        let data = fixture(tmp.path());
        let source = data.join("nested/deep/b.txt");

        let volumes = compress(&source, tmp.path().join("single"), &CompressOptions::new(format))
            .unwrap();
        assert_eq!(volumes, vec![tmp.path().join(format!("single{ext}"))]);

        let restored = tmp.path().join("restored.txt");
        decompress_file(&volumes[0], &restored).unwrap();
        assert_eq!(fs::read(&restored).unwrap(), fs::read(&source).unwrap(), "{format:?}");
    }
}

#[test]
fn decompress_sniffs_content() {
    let tmp = TempDir::new().unwrap();
    let data = fixture(tmp.path());

    let options = CompressOptions::new(Format::TarZst);
    let raw = compress(data.join("a.txt"), tmp.path().join("raw"), &options).unwrap();
    let file = tmp.path().join("a-copy.txt");
    assert_eq!(decompress(&raw[0], &file).unwrap(), Decompressed::File);
    assert_eq!(fs::read_to_string(&file).unwrap(), "alpha");

    let framed = compress(&data, tmp.path().join("tree"), &CompressOptions::new(Format::TarGz))
        .unwrap();
    let dir = tmp.path().join("tree-copy");
    assert_eq!(decompress(&framed[0], &dir).unwrap(), Decompressed::Unpacked);
    assert_eq!(snapshot(&dir), snapshot(&data));

    let zipped = compress(&data, tmp.path().join("zipped"), &CompressOptions::new(Format::Zip))
        .unwrap();
    let dir = tmp.path().join("zip-copy");
    assert_eq!(decompress(&zipped[0], &dir).unwrap(), Decompressed::Unpacked);
    assert_eq!(snapshot(&dir), snapshot(&data));
}

#[test]
fn empty_flat_archive_decompresses_to_padding() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("nothing");
    fs::create_dir_all(&source).unwrap();

    let volumes = compress(&source, tmp.path().join("blank"), &CompressOptions::new(Format::TarGz))
        .unwrap();
    let out = tmp.path().join("out");
    assert_eq!(decompress(&volumes[0], &out).unwrap(), Decompressed::File);

    let padding = fs::read(&out).unwrap();
    assert!(!padding.is_empty());
    assert!(padding.iter().all(|&b| b == 0));
}

#[test]
fn empty_prefix_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let data = fixture(tmp.path());

    let err = compress(&data, "", &CompressOptions::default()).unwrap_err();
    assert!(matches!(err, ArchiveError::InvalidDestination(_)), "{err}");
}

#[test]
fn missing_source_is_an_io_error() {
    let tmp = TempDir::new().unwrap();

    let err = compress(tmp.path().join("nope"), tmp.path().join("out"), &CompressOptions::default())
        .unwrap_err();
    assert!(matches!(err, ArchiveError::Io { .. }), "{err}");
}
