//! Storage pool drivers.
//!
//! Every backend implements [`Driver`] so callers can handle any pool the
//! same way. The expected call order is enforced by the caller, not here:
//!
//! ```text
//! create -> (mount <-> unmount)* -> delete
//! ```
//!
//! At most one lifecycle call may run per pool at a time. Calls are
//! blocking; run them on their own thread if several pools are handled at
//! once.

mod common;
mod dir;
mod info;
mod operation;
mod registry;
mod resources;
mod utils;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use depot_common::{DepotError, DepotResult};

pub use common::{DriverCommon, State};
pub use dir::Dir;
pub use info::{Info, VolumeType};
pub use operation::{NoopOperation, Operation};
pub use registry::{DriverConstructor, DriverRegistry};
pub use resources::{PoolResources, ResourceUsage, vfs_get_resources};
pub use utils::{path_is_empty, wipe_directory};

/// Pool configuration: string keys to string values.
pub type PoolConfig = HashMap<String, String>;

/// Reserved key holding the host path backing the pool.
pub const CONFIG_SOURCE: &str = "source";

/// Operations every storage backend provides.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Capabilities of this backend. Safe to call at any time.
    fn info(&self) -> Info;

    /// Pool name.
    fn name(&self) -> &str;

    /// Working copy of the pool configuration, including defaults filled in
    /// by [`Driver::create`].
    fn config(&self) -> &PoolConfig;

    /// Provision the pool's backing storage.
    ///
    /// Only the name and configuration may be relied on; the pool is not
    /// registered yet. Called once per pool.
    ///
    /// # Errors
    ///
    /// Returns a precondition error if the backing storage is unusable.
    fn create(&mut self) -> DepotResult<()>;

    /// Destroy the pool's contents and release its mount.
    ///
    /// # Errors
    ///
    /// Returns the first OS error hit; the pool may be left partially wiped.
    fn delete(&self, op: &dyn Operation) -> DepotResult<()>;

    /// Check a proposed configuration against backend rules.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::Config`] if the configuration is rejected.
    fn validate(&self, config: &PoolConfig) -> DepotResult<()>;

    /// Apply changed configuration keys to an existing pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be applied live.
    fn update(&mut self, changed: &PoolConfig) -> DepotResult<()>;

    /// Attach the backing storage at the pool's mount path.
    ///
    /// Returns `true` only if this call mounted something.
    ///
    /// # Errors
    ///
    /// Returns an OS error if mounting fails.
    fn mount(&self) -> DepotResult<bool>;

    /// Detach the backing storage from the pool's mount path.
    ///
    /// Returns `true` only if this call unmounted something.
    ///
    /// # Errors
    ///
    /// Returns an OS error if unmounting fails.
    fn unmount(&self) -> DepotResult<bool>;

    /// Report capacity and usage.
    ///
    /// # Errors
    ///
    /// Returns an OS error if the storage cannot be queried.
    fn get_resources(&self) -> DepotResult<PoolResources>;
}

/// Check the keys every backend shares.
///
/// # Errors
///
/// Returns [`DepotError::Config`] if `source` is set to a relative path.
pub fn validate_common(config: &PoolConfig) -> DepotResult<()> {
    if let Some(source) = config.get(CONFIG_SOURCE).filter(|s| !s.is_empty()) {
        if !Path::new(source).is_absolute() {
            return Err(DepotError::Config {
                message: format!("'{CONFIG_SOURCE}' must be an absolute path, got '{source}'"),
            });
        }
    }
    Ok(())
}
