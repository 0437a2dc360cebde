//! Filesystem operations
//!
//! Handles file and directory mutations. Callers go through
//! [`crate::infra::process::ProcessRunner`], which skips these in dry-run mode.

use std::path::Path;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Copy a file over `to`, keeping the permission bits of `from`
pub fn copy_file(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| FilesystemError::CopyFile {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            error: e.to_string(),
        })
}

/// Remove a file or symlink if present
pub fn remove_file(path: &Path) -> Result<(), FilesystemError> {
    if path.symlink_metadata().is_ok() {
        std::fs::remove_file(path).map_err(|e| FilesystemError::RemoveFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Create a symbolic link at `link` pointing to `target`
pub fn symlink(target: &Path, link: &Path) -> Result<(), FilesystemError> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);
    #[cfg(windows)]
    let result = if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    };

    result.map_err(|e| FilesystemError::Symlink {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        error: e.to_string(),
    })
}
