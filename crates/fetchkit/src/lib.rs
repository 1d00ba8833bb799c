//! # Fetchkit
//!
//! Fetch toolchain archives over HTTP and unpack them in place.
//!
//! The library has two independent halves that callers compose:
//!
//! - [`Fetcher`] downloads one URL, or the first working URL of a fallback
//!   chain, to a destination file in fixed-size chunks
//! - [`extract`] unpacks a zip, `.gz` or `.xz` tarball beside itself and
//!   optionally removes it
//!
//! Both report progress through a [`ProgressSink`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use fetchkit::{extract, ConsoleProgress, ExtractOptions, FetchSource, Fetcher};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new()?;
//! let source = FetchSource::Candidates(vec![
//!     "https://mirror-a.example.com/premake-5.0.0-beta2-linux.tar.gz".to_string(),
//!     "https://mirror-b.example.com/premake-5.0.0-beta2-linux.tar.gz".to_string(),
//! ]);
//! let mut progress = ConsoleProgress::stdout();
//!
//! let archive = fetcher.fetch(
//!     &source,
//!     Path::new("Thirdparty/premake/premake.tar.gz"),
//!     &mut progress,
//! )?;
//!
//! let outcome = extract(&archive, &ExtractOptions::default(), &mut progress)?;
//! if let Some(stats) = outcome.stats() {
//!     println!("Extracted {} entries", stats.entries_extracted);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extract;
pub mod fetch;
pub mod probe;
pub mod progress;
pub mod safety;
pub mod types;

// Re-export main types
pub use error::{ExtractError, FetchError, SecurityError};
pub use fetch::{Download, FetchSource, Fetcher, HttpTransport, Transport};
pub use probe::ArchiveHandle;
pub use progress::{ConsoleProgress, NoProgress, ProgressSink, ProgressSnapshot, ProgressState};
pub use types::{
    ArchiveEntry, ArchiveFormat, ArchiveInfo, ExtractOptions, ExtractOutcome, ExtractStats,
};

use std::path::{Path, PathBuf};

/// Download `source` to `destination` over HTTP with the default browser
/// User-Agent.
///
/// # Errors
///
/// See [`Fetcher::fetch`].
pub fn fetch(
    source: &FetchSource,
    destination: &Path,
    progress: &mut dyn ProgressSink,
) -> Result<PathBuf, FetchError> {
    Fetcher::new()?.fetch(source, destination, progress)
}

/// Probe an archive to list its entries without extracting.
///
/// # Errors
///
/// Returns an error if the extension is not a supported archive format, the
/// file doesn't exist, or the archive cannot be read.
pub fn probe(path: &Path) -> Result<ArchiveInfo, ExtractError> {
    probe::probe_archive(path)
}

/// Extract an archive into the directory that contains it.
///
/// # Errors
///
/// See [`extract::extract_archive`].
pub fn extract(
    archive_path: &Path,
    options: &ExtractOptions,
    progress: &mut dyn ProgressSink,
) -> Result<ExtractOutcome, ExtractError> {
    extract::extract_archive(archive_path, options, progress)
}
