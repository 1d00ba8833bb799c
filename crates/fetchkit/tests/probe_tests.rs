//! Integration tests for archive probing functionality.

use fetchkit::{probe, ArchiveFormat, ExtractError};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a test archive directory
fn setup_test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Helper function to create a ZIP archive
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) -> std::io::Result<()> {
    let file = File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(file);

    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in files {
        zip.start_file(*name, options)?;
        zip.write_all(content)?;
    }

    zip.finish()?;
    Ok(())
}

/// Helper function to create a TAR.GZ archive with a leading directory member
fn create_tar_gz_archive(archive_path: &Path, files: &[(&str, &[u8])]) -> std::io::Result<()> {
    let file = File::create(archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(encoder);

    let mut dir = tar::Header::new_gnu();
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_size(0);
    dir.set_mode(0o755);
    dir.set_cksum();
    tar.append_data(&mut dir, "bin/", std::io::empty())?;

    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append_data(&mut header, name, &content[..])?;
    }

    tar.into_inner()?.finish()?;
    Ok(())
}

#[test]
fn test_probe_zip_lists_entries_and_sizes() {
    let dir = setup_test_dir();
    let archive_path = dir.path().join("premake.zip");
    create_zip_archive(
        &archive_path,
        &[("premake5.exe", &[0u8; 300]), ("LICENSE.txt", b"BSD")],
    )
    .unwrap();

    let info = probe(&archive_path).unwrap();

    assert_eq!(info.format, ArchiveFormat::Zip);
    assert_eq!(info.entries.len(), 2);
    assert_eq!(info.entries[0].name, "premake5.exe");
    assert_eq!(info.entries[0].size, 300);
    assert!(info.entries[0].is_file);
    assert_eq!(info.total_size, 303);
}

#[test]
fn test_probe_tar_gz_counts_regular_files_only() {
    let dir = setup_test_dir();
    let archive_path = dir.path().join("premake-linux.tar.gz");
    create_tar_gz_archive(&archive_path, &[("bin/premake5", b"#!/bin/sh\n")]).unwrap();

    let info = probe(&archive_path).unwrap();

    assert_eq!(info.format, ArchiveFormat::TarGzip);
    assert_eq!(info.entries.len(), 2);
    assert!(!info.entries[0].is_file);
    assert!(info.entries[1].is_file);
    assert_eq!(info.total_size, 10);
}

#[test]
fn test_probe_does_not_modify_archive() {
    let dir = setup_test_dir();
    let archive_path = dir.path().join("keep.zip");
    create_zip_archive(&archive_path, &[("a.txt", b"a")]).unwrap();

    probe(&archive_path).unwrap();

    assert!(archive_path.exists());
    assert!(!dir.path().join("a.txt").exists());
}

#[test]
fn test_probe_info_serializes_to_json() {
    let dir = setup_test_dir();
    let archive_path = dir.path().join("a.zip");
    create_zip_archive(&archive_path, &[("a.txt", b"abc")]).unwrap();

    let info = probe(&archive_path).unwrap();
    let json = serde_json::to_value(&info).unwrap();

    assert_eq!(json["format"], "zip");
    assert_eq!(json["total_size"], 3);
    assert_eq!(json["entries"][0]["name"], "a.txt");
}

#[test]
fn test_probe_missing_file() {
    let dir = setup_test_dir();
    let result = probe(&dir.path().join("missing.tar.xz"));
    assert!(matches!(result, Err(ExtractError::NotFound(_))));
}

#[test]
fn test_probe_unsupported_extension() {
    let dir = setup_test_dir();
    let path = dir.path().join("archive.7z");
    File::create(&path).unwrap();

    let result = probe(&path);
    assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
}

#[test]
fn test_probe_corrupted_gzip() {
    let dir = setup_test_dir();
    let path = dir.path().join("broken.tar.gz");
    std::fs::write(&path, b"not gzip at all").unwrap();

    assert!(probe(&path).is_err());
}
