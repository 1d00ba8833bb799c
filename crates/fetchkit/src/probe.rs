//! Archive inspection: format resolution and entry listing without extraction.

use crate::error::ExtractError;
use crate::types::{ArchiveEntry, ArchiveFormat, ArchiveInfo};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

/// An archive path resolved to an absolute location, with its detected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    path: PathBuf,
    format: ArchiveFormat,
}

impl ArchiveHandle {
    /// Resolves `path` to an absolute path and detects its format.
    ///
    /// The file does not need to exist.
    pub fn resolve(path: &Path) -> Result<Self, ExtractError> {
        let path = std::path::absolute(path)?;
        let format = ArchiveFormat::from_path(&path);
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Directory the archive lives in; entries are extracted here.
    pub fn output_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Final extension with its leading dot, or an empty string.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }
}

/// Probe an archive to list its entries without extracting.
///
/// # Errors
///
/// Returns an error if:
/// - The extension is not a supported archive format
/// - The archive file doesn't exist
/// - The archive cannot be read
pub fn probe_archive(path: &Path) -> Result<ArchiveInfo, ExtractError> {
    let handle = ArchiveHandle::resolve(path)?;

    if handle.format() == ArchiveFormat::Unsupported {
        return Err(ExtractError::UnsupportedFormat(format!(
            "Unknown extension: {}",
            handle.extension()
        )));
    }

    if !handle.path().exists() {
        return Err(ExtractError::NotFound(handle.path().to_path_buf()));
    }

    let entries = match handle.format() {
        ArchiveFormat::Zip => list_zip_entries(&mut open_zip(handle.path())?)?,
        format => list_tar_entries(&mut tar::Archive::new(tar_reader(handle.path(), format)?))?,
    };
    let total_size = extractable_size(handle.format(), &entries);

    Ok(ArchiveInfo {
        format: handle.format(),
        entries,
        total_size,
    })
}

/// Sum the progress denominator starts from.
///
/// Zip counts every entry; tar counts regular files only.
pub fn extractable_size(format: ArchiveFormat, entries: &[ArchiveEntry]) -> u64 {
    entries
        .iter()
        .filter(|e| !format.is_tar() || e.is_file)
        .map(|e| e.size)
        .sum()
}

pub(crate) fn open_zip(path: &Path) -> Result<zip::ZipArchive<BufReader<File>>, ExtractError> {
    let file = BufReader::new(File::open(path)?);
    Ok(zip::ZipArchive::new(file)?)
}

/// List entries in a ZIP archive, in central directory order.
pub(crate) fn list_zip_entries<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<Vec<ArchiveEntry>, ExtractError> {
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        entries.push(ArchiveEntry {
            name: entry.name().to_string(),
            size: entry.size(),
            is_file: entry.is_file(),
        });
    }

    Ok(entries)
}

/// Opens the decompressed tar stream of a gzip or xz tarball.
///
/// Both decoders stream from disk; corrupt data surfaces as an I/O error
/// when the member that covers it is read.
pub(crate) fn tar_reader(
    path: &Path,
    format: ArchiveFormat,
) -> Result<Box<dyn Read>, ExtractError> {
    let file = BufReader::new(File::open(path)?);

    match format {
        ArchiveFormat::TarGzip => Ok(Box::new(flate2::read::GzDecoder::new(file))),
        ArchiveFormat::TarXz => Ok(Box::new(xz2::bufread::XzDecoder::new(file))),
        other => Err(ExtractError::UnsupportedFormat(format!(
            "Not a tarball: {other}"
        ))),
    }
}

/// List members of a TAR stream.
pub(crate) fn list_tar_entries<R: Read>(
    archive: &mut tar::Archive<R>,
) -> Result<Vec<ArchiveEntry>, ExtractError> {
    let mut entries = Vec::new();

    for entry_result in archive.entries()? {
        let entry = entry_result?;
        let header = entry.header();

        entries.push(ArchiveEntry {
            name: entry.path()?.to_string_lossy().to_string(),
            size: header.size()?,
            is_file: header.entry_type().is_file(),
        });
    }

    Ok(entries)
}
