//! Type definitions for archive extraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Archive format, resolved once from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    /// `.zip`
    Zip,
    /// `.gz`, a gzip-compressed tarball
    TarGzip,
    /// `.xz`, an xz-compressed tarball
    TarXz,
    /// Anything else
    Unsupported,
}

impl ArchiveFormat {
    /// Detects the format from the literal final extension of `path`.
    ///
    /// Matching is case-sensitive: `archive.ZIP` is unsupported.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("zip") => Self::Zip,
            Some("gz") => Self::TarGzip,
            Some("xz") => Self::TarXz,
            _ => Self::Unsupported,
        }
    }

    /// Whether the format is handled by the tar extractor.
    pub fn is_tar(self) -> bool {
        matches!(self, Self::TarGzip | Self::TarXz)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zip => "ZIP",
            Self::TarGzip => "TAR.GZ",
            Self::TarXz => "TAR.XZ",
            Self::Unsupported => "UNSUPPORTED",
        };
        f.write_str(name)
    }
}

/// Individual entry within an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Stored relative name of the entry
    pub name: String,

    /// Declared uncompressed size in bytes
    pub size: u64,

    /// Whether this entry is a regular file (not a directory or link)
    pub is_file: bool,
}

/// Metadata about an archive, gathered without extracting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveInfo {
    /// Detected archive format
    pub format: ArchiveFormat,

    /// All entries in archive order
    pub entries: Vec<ArchiveEntry>,

    /// Extractable size the progress total starts from.
    ///
    /// Zip counts every entry; tar counts regular files only.
    pub total_size: u64,
}

/// Options for extracting an archive.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Remove the archive after a successful extraction
    pub delete_archive: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            delete_archive: true,
        }
    }
}

/// Statistics about a completed extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Number of entries written to disk
    pub entries_extracted: u64,

    /// Number of entries not written, because the target already existed
    /// or the entry name was unsafe
    pub entries_skipped: u64,

    /// Declared bytes of the extracted entries
    pub bytes_extracted: u64,

    /// Duration of the extraction (in seconds)
    #[serde(with = "duration_serde")]
    pub duration: Duration,

    /// Whether the archive was removed afterwards
    pub archive_deleted: bool,
}

/// Result of an extraction call that did not fail.
#[derive(Debug, Clone)]
#[must_use]
pub enum ExtractOutcome {
    /// The archive was extracted.
    Extracted(ExtractStats),

    /// The extension is not a known archive format; nothing was touched.
    Unsupported {
        /// The extension that was not recognized, with its leading dot
        extension: String,
    },
}

impl ExtractOutcome {
    /// Statistics of a completed extraction, if there was one.
    pub fn stats(&self) -> Option<&ExtractStats> {
        match self {
            Self::Extracted(stats) => Some(stats),
            Self::Unsupported { .. } => None,
        }
    }

    /// Whether the format was not recognized.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
