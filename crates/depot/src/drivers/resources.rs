//! Capacity reporting for filesystem-backed pools.

use std::path::Path;

use depot_common::{DepotError, DepotResult};
use serde::Serialize;

/// Total and used amount of one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    /// Total capacity.
    pub total: u64,
    /// Amount in use.
    pub used: u64,
}

/// Usage snapshot of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolResources {
    /// Space in bytes.
    pub space: ResourceUsage,
    /// Inodes.
    pub inodes: ResourceUsage,
}

/// Report capacity and usage of the filesystem holding `path`.
///
/// # Errors
///
/// Returns [`DepotError::Stat`] if the filesystem cannot be queried.
pub fn vfs_get_resources(path: &Path) -> DepotResult<PoolResources> {
    let st = rustix::fs::statvfs(path).map_err(|e| DepotError::Stat {
        path: path.to_path_buf(),
        error: e.into(),
    })?;

    let resources = PoolResources {
        space: ResourceUsage {
            total: st.f_blocks.saturating_mul(st.f_frsize),
            used: st.f_blocks.saturating_sub(st.f_bfree).saturating_mul(st.f_frsize),
        },
        inodes: ResourceUsage {
            total: st.f_files,
            used: st.f_files.saturating_sub(st.f_ffree),
        },
    };

    tracing::debug!(path = %path.display(), ?resources, "Collected pool resources");
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_bounded_by_total() {
        let dir = tempfile::tempdir().unwrap();
        let res = vfs_get_resources(dir.path()).unwrap();
        assert!(res.space.total > 0);
        assert!(res.space.used <= res.space.total);
        assert!(res.inodes.used <= res.inodes.total);
    }

    #[test]
    fn missing_path_is_stat_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = vfs_get_resources(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, DepotError::Stat { .. }));
    }
}
