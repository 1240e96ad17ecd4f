//! Filesystem helpers shared by local drivers.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use depot_common::DepotResult;

/// Whether a directory has no entries.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn path_is_empty(path: &Path) -> DepotResult<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Remove every entry below `path`, keeping `path` itself.
///
/// A missing directory counts as already wiped. Stops at the first entry
/// that cannot be removed.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or an entry cannot be
/// removed.
pub fn wipe_directory(path: &Path) -> DepotResult<()> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let entry_path = entry.path();
        tracing::debug!(path = %entry_path.display(), "Removing pool entry");

        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&entry_path)?;
        } else {
            fs::remove_file(&entry_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_non_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(path_is_empty(dir.path()).unwrap());

        fs::write(dir.path().join("a.txt"), "x").unwrap();
        assert!(!path_is_empty(dir.path()).unwrap());
    }

    #[test]
    fn wipe_keeps_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("nested/deeper/file"), "x").unwrap();
        fs::write(dir.path().join("top"), "x").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink("/etc", dir.path().join("link")).unwrap();

        wipe_directory(dir.path()).unwrap();

        assert!(dir.path().is_dir());
        assert!(path_is_empty(dir.path()).unwrap());
        assert!(Path::new("/etc").exists());
    }

    #[test]
    fn wipe_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        wipe_directory(&dir.path().join("gone")).unwrap();
    }
}
