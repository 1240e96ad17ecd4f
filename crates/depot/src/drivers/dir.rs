//! Directory-backed pools.
//!
//! The pool's mount path is either the source directory itself or a bind
//! mount of a directory elsewhere on the host.

use std::path::Path;

use depot_common::{DepotError, DepotResult, clean_path};

use super::{
    CONFIG_SOURCE, Driver, DriverCommon, Info, Operation, PoolConfig, PoolResources, VolumeType,
    path_is_empty, vfs_get_resources, wipe_directory,
};
use crate::mount::{force_unmount, same_mount, try_mount};

/// Driver for pools backed by a plain host directory.
#[derive(Debug, Clone)]
pub struct Dir {
    common: DriverCommon,
}

impl Dir {
    /// Capabilities of the directory driver.
    pub const INFO: Info = Info {
        name: "dir",
        version: "1",
        optimized_images: false,
        preserves_inodes: false,
        remote: false,
        volume_types: &[
            VolumeType::Custom,
            VolumeType::Image,
            VolumeType::Container,
            VolumeType::VirtualMachine,
        ],
        block_backing: false,
        running_quota_resize: true,
        running_snapshot_freeze: true,
    };

    /// Create a directory driver instance.
    #[must_use]
    pub const fn new(common: DriverCommon) -> Self {
        Self { common }
    }

    pub(super) fn boxed(common: DriverCommon) -> Box<dyn Driver> {
        Box::new(Self::new(common))
    }

    /// Whether the source is the mount path itself, leaving nothing to mount.
    fn is_self_managed(&self) -> DepotResult<bool> {
        let path = self.common.mount_path()?;
        Ok(self.common.source() == Some(path.as_path()))
    }
}

impl Driver for Dir {
    fn info(&self) -> Info {
        Self::INFO
    }

    fn name(&self) -> &str {
        self.common.name()
    }

    fn config(&self) -> &PoolConfig {
        self.common.config()
    }

    fn create(&mut self) -> DepotResult<()> {
        let path = self.common.mount_path()?;

        if self.common.source().is_none() {
            self.common
                .config_mut()
                .insert(CONFIG_SOURCE.to_string(), path.display().to_string());
        }
        let source = self
            .common
            .source()
            .map_or_else(|| path.clone(), Path::to_path_buf);

        if !source.exists() {
            return Err(DepotError::SourceNotFound { path: source });
        }

        let cleaned = clean_path(&source);
        if self.common.state().paths.is_managed(&cleaned) && cleaned != path {
            return Err(DepotError::SourceInManagedDir { path: source });
        }

        if !path_is_empty(&source)? {
            return Err(DepotError::SourceNotEmpty { path: source });
        }

        tracing::info!(
            pool = self.common.name(),
            source = %source.display(),
            "Directory pool created"
        );
        Ok(())
    }

    fn delete(&self, op: &dyn Operation) -> DepotResult<()> {
        let path = self.common.mount_path()?;

        op.update_progress("wipe", 0);
        wipe_directory(&path)?;
        op.update_progress("wipe", 100);

        op.update_progress("unmount", 0);
        self.unmount()?;
        op.update_progress("unmount", 100);

        tracing::info!(pool = self.common.name(), "Directory pool deleted");
        Ok(())
    }

    fn validate(&self, _config: &PoolConfig) -> DepotResult<()> {
        Ok(())
    }

    fn update(&mut self, _changed: &PoolConfig) -> DepotResult<()> {
        Ok(())
    }

    fn mount(&self) -> DepotResult<bool> {
        if self.is_self_managed()? {
            return Ok(false);
        }

        let path = self.common.mount_path()?;
        let Some(source) = self.common.source() else {
            return Err(DepotError::Config {
                message: format!(
                    "pool '{}' has no '{CONFIG_SOURCE}' configured",
                    self.common.name()
                ),
            });
        };

        if same_mount(source, &path) {
            tracing::debug!(pool = self.common.name(), "Pool already mounted");
            return Ok(false);
        }

        try_mount(source, &path)?;
        tracing::info!(
            pool = self.common.name(),
            source = %source.display(),
            target = %path.display(),
            "Directory pool mounted"
        );
        Ok(true)
    }

    fn unmount(&self) -> DepotResult<bool> {
        if self.is_self_managed()? {
            return Ok(false);
        }

        let path = self.common.mount_path()?;
        let unmounted = force_unmount(&path)?;
        if unmounted {
            tracing::info!(
                pool = self.common.name(),
                target = %path.display(),
                "Directory pool unmounted"
            );
        }
        Ok(unmounted)
    }

    fn get_resources(&self) -> DepotResult<PoolResources> {
        vfs_get_resources(&self.common.mount_path()?)
    }
}
