//! Entry name validation for archive extraction.
//!
//! Archive entries carry their own relative names; before a name is joined to
//! the output directory it must stay inside it (no zip-slip).

use crate::error::SecurityError;
use std::path::{Component, Path, PathBuf};

/// Validates and normalizes an archive entry path.
///
/// - Rejects absolute paths
/// - Rejects paths containing ".." components
/// - Drops "." components and redundant separators
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use fetchkit::safety::validate_entry_path;
///
/// let safe_path = validate_entry_path(Path::new("bin/premake5")).unwrap();
/// assert_eq!(safe_path, Path::new("bin/premake5"));
///
/// assert!(validate_entry_path(Path::new("../../etc/passwd")).is_err());
/// assert!(validate_entry_path(Path::new("/etc/passwd")).is_err());
/// ```
pub fn validate_entry_path(path: &Path) -> Result<PathBuf, SecurityError> {
    if path.is_absolute() || path.has_root() {
        return Err(SecurityError::AbsolutePath(path.display().to_string()));
    }

    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => continue,
            Component::ParentDir => {
                return Err(SecurityError::PathTraversal(format!(
                    "Path contains '..' component: {}",
                    path.display()
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SecurityError::AbsolutePath(path.display().to_string()));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(SecurityError::PathTraversal(
            "Path normalizes to empty".to_string(),
        ));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entry_path_valid() {
        let result = validate_entry_path(Path::new("LICENSE.txt"));
        assert_eq!(result.unwrap(), Path::new("LICENSE.txt"));

        let result = validate_entry_path(Path::new("1.3.283.0/x86_64/bin/glslc"));
        assert_eq!(result.unwrap(), Path::new("1.3.283.0/x86_64/bin/glslc"));

        let result = validate_entry_path(Path::new("./dir/file.txt"));
        assert_eq!(result.unwrap(), Path::new("dir/file.txt"));
    }

    #[test]
    fn test_validate_entry_path_absolute() {
        let result = validate_entry_path(Path::new("/etc/passwd"));
        assert!(matches!(result, Err(SecurityError::AbsolutePath(_))));
    }

    #[test]
    fn test_validate_entry_path_traversal() {
        for bad in [
            "../etc/passwd",
            "../../etc/passwd",
            "dir/../etc/passwd",
            "dir/..",
            "./../../etc/passwd",
        ] {
            let result = validate_entry_path(Path::new(bad));
            assert!(
                matches!(result, Err(SecurityError::PathTraversal(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_entry_path_edge_cases() {
        assert!(validate_entry_path(Path::new("dir//file.txt")).is_ok());

        let result = validate_entry_path(Path::new("./././file.txt"));
        assert_eq!(result.unwrap(), Path::new("file.txt"));

        // Only "." normalizes to empty
        assert!(validate_entry_path(Path::new(".")).is_err());

        // Directory entries in zip archives end with a slash
        let result = validate_entry_path(Path::new("dir/subdir/"));
        assert_eq!(result.unwrap(), Path::new("dir/subdir"));
    }

    #[test]
    fn test_validate_entry_path_unicode() {
        let result = validate_entry_path(Path::new("日本語/ファイル.txt"));
        assert_eq!(result.unwrap(), Path::new("日本語/ファイル.txt"));

        assert!(validate_entry_path(Path::new("日本語/../etc/passwd")).is_err());
    }
}
