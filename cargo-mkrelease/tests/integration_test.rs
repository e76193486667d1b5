//! Integration tests for cargo-mkrelease
//!
//! These tests run the whole packaging pipeline against a scratch project.

use blake2::Blake2b512;
use cargo_mkrelease::builder::{BinaryBuilder, ReleaseBuilder};
use cargo_mkrelease::cli::{ArchiveFormat, Args};
use cargo_mkrelease::error::MkReleaseError;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test helper to create a project with release documents and a prebuilt binary
fn setup_test_project(name: &str, version: &str) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let cargo_toml = format!(
        r#"[package]
name = "{name}"
version = "{version}"
edition = "2021"

[dependencies]
"#
    );
    fs::write(root.join("Cargo.toml"), cargo_toml).expect("Failed to write Cargo.toml");

    fs::write(root.join("CHANGELOG.md"), "# Changelog\n").unwrap();
    fs::write(root.join("LICENSE"), "MIT License\n").unwrap();
    fs::write(root.join("README.md"), format!("# {name}\n")).unwrap();

    // Empty project config so a user-wide config never leaks into tests
    fs::create_dir_all(root.join(".config")).unwrap();
    fs::write(root.join(".config/mkrelease.toml"), "").unwrap();

    fs::create_dir_all(root.join("target/release")).unwrap();
    fs::write(root.join(format!("target/release/{name}.exe")), b"MZ fake binary").unwrap();

    temp_dir
}

fn windows_args(project_dir: &Path, format: ArchiveFormat) -> Args {
    let mut args = Args::for_project(project_dir);
    args.config = Some(PathBuf::from(".config/mkrelease.toml"));
    args.platform = Some("windows".to_string());
    args.format = Some(format);
    args
}

fn read_zip_entry(archive: &mut zip::ZipArchive<fs::File>, name: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    archive
        .by_name(name)
        .unwrap_or_else(|e| panic!("missing {name}: {e}"))
        .read_to_end(&mut buf)
        .unwrap();
    buf
}

#[test]
fn test_zip_release_scenario() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();

    let report = ReleaseBuilder::new(windows_args(root, ArchiveFormat::Zip))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.archive_name, "relay-v2.1.0-x86_64-windows");
    let archive_path = report.archive_path.clone().unwrap();
    assert_eq!(archive_path, root.join("relay-v2.1.0-x86_64-windows.zip"));
    assert!(archive_path.exists());
    assert!(!root.join("relay").exists(), "staging directory must be removed");
    assert_eq!(
        report.staged_files,
        vec!["CHANGELOG.md", "LICENSE", "README.md", "relay.exe"]
    );

    let mut zip = zip::ZipArchive::new(fs::File::open(&archive_path).unwrap()).unwrap();
    let mut files: Vec<String> = zip
        .file_names()
        .filter(|n| !n.ends_with('/'))
        .map(str::to_string)
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "relay/B2SUMS",
            "relay/CHANGELOG.md",
            "relay/LICENSE",
            "relay/README.md",
            "relay/SHA256SUMS",
            "relay/relay.exe",
        ]
    );

    let b2sums = String::from_utf8(read_zip_entry(&mut zip, "relay/B2SUMS")).unwrap();
    let sha256sums = String::from_utf8(read_zip_entry(&mut zip, "relay/SHA256SUMS")).unwrap();
    assert_eq!(b2sums.lines().count(), 4);
    assert_eq!(sha256sums.lines().count(), 4);

    for line in b2sums.lines() {
        let (digest, name) = line.split_once(' ').unwrap();
        let bytes = read_zip_entry(&mut zip, &format!("relay/{name}"));
        assert_eq!(digest, hex::encode(Blake2b512::digest(&bytes)));
        assert_eq!(report.digests.blake2.get(name), Some(digest));
    }
    for line in sha256sums.lines() {
        let (digest, name) = line.split_once(' ').unwrap();
        let bytes = read_zip_entry(&mut zip, &format!("relay/{name}"));
        assert_eq!(digest, hex::encode(Sha256::digest(&bytes)));
    }
}

#[test]
fn test_rerun_replaces_existing_archive() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();
    let archive_path = root.join("relay-v2.1.0-x86_64-windows.zip");
    fs::write(&archive_path, b"stale archive").unwrap();
    fs::create_dir_all(root.join("relay")).unwrap();
    fs::write(root.join("relay/leftover.txt"), b"from an earlier run").unwrap();

    ReleaseBuilder::new(windows_args(root, ArchiveFormat::Zip))
        .unwrap()
        .run()
        .unwrap();

    let mut zip = zip::ZipArchive::new(fs::File::open(&archive_path).unwrap()).unwrap();
    assert!(zip.by_name("relay/leftover.txt").is_err());
    assert_eq!(read_zip_entry(&mut zip, "relay/relay.exe"), b"MZ fake binary");
}

#[test]
fn test_repeated_runs_are_identical() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();

    let first = ReleaseBuilder::new(windows_args(root, ArchiveFormat::Tgz))
        .unwrap()
        .run()
        .unwrap();
    let second = ReleaseBuilder::new(windows_args(root, ArchiveFormat::Tgz))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first.staged_files, second.staged_files);
    assert_eq!(first.digests, second.digests);
    assert_eq!(
        second.archive_path,
        Some(root.join("relay-v2.1.0-x86_64-windows.tar.gz"))
    );
}

#[test]
fn test_no_archive_format_discards_staging() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();

    let report = ReleaseBuilder::new(windows_args(root, ArchiveFormat::None))
        .unwrap()
        .run()
        .unwrap();

    assert!(report.archive_path.is_none());
    assert_eq!(report.digests.sha256.len(), 4);
    assert!(!root.join("relay").exists());
    assert!(!root.join("relay-v2.1.0-x86_64-windows.zip").exists());
}

#[test]
fn test_separate_output_dir() {
    let project = setup_test_project("relay", "2.1.0");
    let output = TempDir::new().unwrap();

    let mut args = windows_args(project.path(), ArchiveFormat::Zip);
    args.output_dir = Some(output.path().to_path_buf());
    args.arch = Some("aarch64".to_string());

    let report = ReleaseBuilder::new(args).unwrap().run().unwrap();

    assert_eq!(
        report.archive_path,
        Some(output.path().join("relay-v2.1.0-aarch64-windows.zip"))
    );
    assert!(!project.path().join("relay-v2.1.0-aarch64-windows.zip").exists());
}

#[test]
fn test_missing_version_fails() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();
    fs::write(root.join("Cargo.toml"), "[package]\nname = \"relay\"\n").unwrap();

    let err = ReleaseBuilder::new(windows_args(root, ArchiveFormat::Zip))
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MkReleaseError>(),
        Some(MkReleaseError::MissingMetadata { field: "version", .. })
    ));
    assert!(!root.join("relay-v-x86_64-windows.zip").exists());
}

#[test]
fn test_missing_release_file_fails() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();
    fs::remove_file(root.join("CHANGELOG.md")).unwrap();

    let err = ReleaseBuilder::new(windows_args(root, ArchiveFormat::Zip))
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MkReleaseError>(),
        Some(MkReleaseError::MissingReleaseFile { .. })
    ));
    assert!(!root.join("relay-v2.1.0-x86_64-windows.zip").exists());
}

#[test]
fn test_build_failure_aborts() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();
    fs::remove_file(root.join("target/release/relay.exe")).unwrap();

    let err = ReleaseBuilder::new(windows_args(root, ArchiveFormat::Zip))
        .unwrap()
        .with_binary_builder(BinaryBuilder::with_program("/nonexistent/cargo", "release"))
        .run()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MkReleaseError>(),
        Some(MkReleaseError::BuildFailed { .. })
    ));
    assert!(!root.join("relay").exists());
}

#[test]
fn test_missing_manifest_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join(".config")).unwrap();
    fs::write(temp_dir.path().join(".config/mkrelease.toml"), "").unwrap();
    let err = ReleaseBuilder::new(windows_args(temp_dir.path(), ArchiveFormat::Zip))
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MkReleaseError>(),
        Some(MkReleaseError::Io(_))
    ));
}

#[test]
fn test_missing_explicit_config_fails() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();

    let mut args = windows_args(root, ArchiveFormat::Zip);
    args.config = Some(PathBuf::from("relase.toml"));

    let err = ReleaseBuilder::new(args).err().expect("missing config must fail");
    assert!(matches!(
        err.downcast_ref::<MkReleaseError>(),
        Some(MkReleaseError::Config { .. })
    ));
    assert!(!root.join("relay-v2.1.0-x86_64-windows.zip").exists());
}

#[cfg(unix)]
#[test]
fn test_symlinked_changelog_archived_under_its_own_name() {
    let project = setup_test_project("relay", "2.1.0");
    let root = project.path();
    fs::remove_file(root.join("CHANGELOG.md")).unwrap();
    fs::create_dir(root.join("docs")).unwrap();
    fs::write(root.join("docs/HISTORY.md"), "# History\n").unwrap();
    std::os::unix::fs::symlink("docs/HISTORY.md", root.join("CHANGELOG.md")).unwrap();

    let report = ReleaseBuilder::new(windows_args(root, ArchiveFormat::Zip))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        report.staged_files,
        vec!["CHANGELOG.md", "LICENSE", "README.md", "relay.exe"]
    );
    assert!(report.digests.sha256.get("CHANGELOG.md").is_some());
    assert!(report.digests.sha256.get("HISTORY.md").is_none());

    let mut zip =
        zip::ZipArchive::new(fs::File::open(report.archive_path.unwrap()).unwrap()).unwrap();
    assert_eq!(read_zip_entry(&mut zip, "relay/CHANGELOG.md"), b"# History\n");
}
