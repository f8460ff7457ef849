//! Filesystem helpers.

use std::path::Path;

use crate::{Error, Result};

/// Convert an IO error into an application error with operation + path context.
pub fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::io_path(op, path, source)
}

/// Ensure a directory exists, creating it (recursively) if needed.
pub fn ensure_dir_all_sync_with_op(op: &'static str, path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| io_error(op, path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs/nested");
        ensure_dir_all_sync_with_op("creating log directory", &nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_error_carries_operation_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();

        let err = ensure_dir_all_sync_with_op("creating log directory", &file.join("sub"))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("creating log directory"));
        assert!(message.contains("sub"));
    }
}
