//! Standard filesystem paths for Depot.
//!
//! Every path handed out here goes through [`clean_path`], and the
//! containment check done by drivers uses the same function, so the two can
//! never disagree about where a pool lives.

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;

use crate::{DepotError, DepotResult};

/// Default managed storage root.
pub static DEPOT_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("DEPOT_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/depot"))
});

/// Directory below the root holding one mount point per pool.
pub const STORAGE_POOLS_DIR: &str = "storage-pools";

/// Standard paths used by the pool drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotPaths {
    /// Managed storage root (default: /var/lib/depot).
    pub root: PathBuf,
}

impl DepotPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: clean_path(root.into()),
        }
    }

    /// Directory holding every pool mount point.
    #[must_use]
    pub fn storage_pools(&self) -> PathBuf {
        self.root.join(STORAGE_POOLS_DIR)
    }

    /// Canonical mount path of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::InvalidPoolName`] if the name could escape the
    /// storage pools directory.
    pub fn pool_mount_path(&self, pool_name: &str) -> DepotResult<PathBuf> {
        let name = sanitize_pool_name(pool_name)?;
        Ok(self.storage_pools().join(name))
    }

    /// Whether `path`, once cleaned, sits at or below the managed root.
    #[must_use]
    pub fn is_managed(&self, path: &Path) -> bool {
        clean_path(path).starts_with(&self.root)
    }

    /// Create the root and the storage pools directory.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.storage_pools())
    }
}

impl Default for DepotPaths {
    fn default() -> Self {
        Self::with_root(DEPOT_ROOT.clone())
    }
}

/// Check that a pool name is usable as a single path component.
///
/// Names are rejected rather than rewritten so that distinct names always
/// map to distinct mount paths.
///
/// # Errors
///
/// Returns [`DepotError::InvalidPoolName`] describing the first problem found.
pub fn sanitize_pool_name(name: &str) -> DepotResult<&str> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name == "." || name == ".." {
        "name is a relative path reference"
    } else if name.contains('/') {
        "name contains a path separator"
    } else if name.contains('\0') {
        "name contains a NUL byte"
    } else {
        return Ok(name);
    };

    Err(DepotError::InvalidPoolName {
        name: name.to_string(),
        reason,
    })
}

/// Lexically normalize a path without touching the filesystem.
///
/// Repeated separators and `.` components are dropped, `..` consumes the
/// preceding component, and `..` at the root stays at the root.
#[must_use]
pub fn clean_path(path: impl AsRef<Path>) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.as_ref().components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
