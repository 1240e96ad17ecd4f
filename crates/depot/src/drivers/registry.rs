//! Driver lookup by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use depot_common::{DepotError, DepotResult};

use super::{Dir, Driver, DriverCommon, Info, PoolConfig, State};

/// Builds a driver instance from its common base.
pub type DriverConstructor = fn(DriverCommon) -> Box<dyn Driver>;

/// Set of known driver variants.
///
/// Owned by whoever dispatches pool operations and passed around by
/// reference; there is no process-wide instance.
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<&'static str, (Info, DriverConstructor)>,
}

impl DriverRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in driver.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Dir::INFO, Dir::boxed);
        registry
    }

    /// Register a driver variant under its info name, replacing any previous one.
    pub fn register(&mut self, info: Info, constructor: DriverConstructor) {
        tracing::debug!(driver = info.name, version = info.version, "Registering storage driver");
        self.drivers.insert(info.name, (info, constructor));
    }

    /// Construct a driver instance for a pool.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::UnknownDriver`] for an unregistered driver or
    /// [`DepotError::InvalidPoolName`] for an unusable pool name.
    pub fn load(
        &self,
        state: Arc<State>,
        driver: &str,
        pool_name: &str,
        config: PoolConfig,
    ) -> DepotResult<Box<dyn Driver>> {
        let (_, constructor) = self
            .drivers
            .get(driver)
            .ok_or_else(|| DepotError::UnknownDriver {
                name: driver.to_string(),
            })?;

        let common = DriverCommon::new(state, pool_name, config)?;
        Ok(constructor(common))
    }

    /// Capability records of all registered drivers, ordered by name.
    #[must_use]
    pub fn supported(&self) -> Vec<Info> {
        self.drivers.values().map(|(info, _)| *info).collect()
    }
}
