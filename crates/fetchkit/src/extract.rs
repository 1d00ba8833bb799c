//! Archive extraction beside the archive, with progress reporting.

use crate::error::ExtractError;
use crate::probe::{
    extractable_size, list_tar_entries, list_zip_entries, open_zip, tar_reader, ArchiveHandle,
};
use crate::progress::{ProgressSink, ProgressState};
use crate::safety::validate_entry_path;
use crate::types::{ArchiveFormat, ExtractOptions, ExtractOutcome, ExtractStats};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Instant;

/// Extract an archive into the directory that contains it.
///
/// - Zip entries whose target file already exists are skipped, and their size
///   is taken out of the progress total
/// - Tar members are always extracted, overwriting existing files
/// - The archive is removed afterwards when `options.delete_archive` is set
///
/// An unrecognized extension is not an error: the call logs it and returns
/// [`ExtractOutcome::Unsupported`] without touching the filesystem.
///
/// # Errors
///
/// Fails on a missing archive, unreadable archive data, a failed entry write,
/// or a failed archive removal. Entries written before the failure stay in
/// place.
pub fn extract_archive(
    archive_path: &Path,
    options: &ExtractOptions,
    progress: &mut dyn ProgressSink,
) -> Result<ExtractOutcome, ExtractError> {
    let start_time = Instant::now();
    let handle = ArchiveHandle::resolve(archive_path)?;

    if handle.format() == ArchiveFormat::Unsupported {
        let extension = handle.extension();
        tracing::warn!("Unsupported file type: {}", extension);
        return Ok(ExtractOutcome::Unsupported { extension });
    }

    if !handle.path().exists() {
        return Err(ExtractError::NotFound(handle.path().to_path_buf()));
    }

    tracing::info!(
        "Extracting {} ({})",
        handle.path().display(),
        handle.format()
    );

    let mut stats = ExtractStats::default();
    match handle.format() {
        ArchiveFormat::Zip => extract_zip(&handle, progress, &mut stats)?,
        _ => extract_tar(&handle, progress, &mut stats)?,
    }
    progress.finish();

    if options.delete_archive {
        fs::remove_file(handle.path()).map_err(|source| ExtractError::DeleteArchive {
            path: handle.path().to_path_buf(),
            source,
        })?;
        stats.archive_deleted = true;
    }

    stats.duration = start_time.elapsed();
    tracing::info!(
        "Extracted {} entries ({} bytes), skipped {}",
        stats.entries_extracted,
        stats.bytes_extracted,
        stats.entries_skipped
    );
    Ok(ExtractOutcome::Extracted(stats))
}

fn extract_zip(
    handle: &ArchiveHandle,
    progress: &mut dyn ProgressSink,
    stats: &mut ExtractStats,
) -> Result<(), ExtractError> {
    let mut archive = open_zip(handle.path())?;
    let entries = list_zip_entries(&mut archive)?;
    let output_dir = handle.output_dir();
    let mut state = ProgressState::new(Some(extractable_size(ArchiveFormat::Zip, &entries)));

    for (index, entry) in entries.iter().enumerate() {
        let relative = match validate_entry_path(Path::new(&entry.name)) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Skipping entry {}: {}", entry.name, e);
                state.shrink_total(entry.size);
                stats.entries_skipped += 1;
                progress.update(&state.snapshot());
                continue;
            }
        };
        let output_path = output_dir.join(&relative);

        if output_path.is_file() {
            tracing::debug!("Already exists, skipping {}", output_path.display());
            state.shrink_total(entry.size);
            stats.entries_skipped += 1;
        } else {
            let mut file = archive.by_index(index)?;

            if file.is_dir() {
                fs::create_dir_all(&output_path)?;
            } else {
                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut outfile = File::create(&output_path)?;
                io::copy(&mut file, &mut outfile)?;

                #[cfg(unix)]
                set_unix_mode(&output_path, file.unix_mode())?;
            }

            state.advance(entry.size);
            stats.entries_extracted += 1;
            stats.bytes_extracted += entry.size;
        }

        progress.update(&state.snapshot());
    }

    if entries.is_empty() {
        progress.update(&state.snapshot());
    }

    Ok(())
}

// TODO: tar members are never skipped when their target exists, unlike zip
// entries. Confirm with the setup owners whether tar should skip as well.
fn extract_tar(
    handle: &ArchiveHandle,
    progress: &mut dyn ProgressSink,
    stats: &mut ExtractStats,
) -> Result<(), ExtractError> {
    // First pass sizes the regular-file members, second pass unpacks them.
    let entries = list_tar_entries(&mut tar::Archive::new(tar_reader(
        handle.path(),
        handle.format(),
    )?))?;
    let mut state = ProgressState::new(Some(extractable_size(handle.format(), &entries)));
    let output_dir = handle.output_dir();

    let mut archive = tar::Archive::new(tar_reader(handle.path(), handle.format())?);
    archive.set_overwrite(true);

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let is_file = entry.header().entry_type().is_file();
        let size = entry.header().size()?;

        if entry.unpack_in(output_dir)? {
            if is_file {
                state.advance(size);
                stats.bytes_extracted += size;
            }
            stats.entries_extracted += 1;
        } else {
            tracing::warn!(
                "Skipping member outside of {}: {}",
                output_dir.display(),
                entry.path()?.display()
            );
            if is_file {
                state.shrink_total(size);
            }
            stats.entries_skipped += 1;
        }

        progress.update(&state.snapshot());
    }

    if entries.is_empty() {
        progress.update(&state.snapshot());
    }

    Ok(())
}

#[cfg(unix)]
fn set_unix_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
    }
    Ok(())
}
