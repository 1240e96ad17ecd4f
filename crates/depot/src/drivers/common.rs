//! State shared by every driver variant.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use depot_common::{DepotPaths, DepotResult, sanitize_pool_name};

use super::{CONFIG_SOURCE, PoolConfig};

/// Host-wide state handed to drivers.
///
/// Drivers only ever read it.
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Managed storage layout.
    pub paths: DepotPaths,
}

impl State {
    /// Create host state around a storage layout.
    #[must_use]
    pub const fn new(paths: DepotPaths) -> Self {
        Self { paths }
    }
}

/// Fields every driver instance carries.
#[derive(Debug, Clone)]
pub struct DriverCommon {
    name: String,
    config: PoolConfig,
    state: Arc<State>,
}

impl DriverCommon {
    /// Create the base for a pool's driver instance.
    ///
    /// # Errors
    ///
    /// Returns [`depot_common::DepotError::InvalidPoolName`] if the name
    /// cannot be mapped to a mount path.
    pub fn new(state: Arc<State>, name: impl Into<String>, config: PoolConfig) -> DepotResult<Self> {
        let name = name.into();
        sanitize_pool_name(&name)?;
        Ok(Self {
            name,
            config,
            state,
        })
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Working copy of the pool configuration.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Mutable working copy of the pool configuration.
    pub fn config_mut(&mut self) -> &mut PoolConfig {
        &mut self.config
    }

    /// Host state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Canonical mount path of this pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool name is rejected by the path resolver.
    pub fn mount_path(&self) -> DepotResult<PathBuf> {
        self.state.paths.pool_mount_path(&self.name)
    }

    /// Configured `source`, if set and non-empty.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.config
            .get(CONFIG_SOURCE)
            .filter(|s| !s.is_empty())
            .map(Path::new)
    }
}
