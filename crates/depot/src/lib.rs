//! # Depot Storage Pools
//!
//! Depot provisions, mounts, unmounts and tears down the storage pools that
//! back instance filesystems on a container or VM host.
//!
//! ## Features
//!
//! - **Uniform driver contract**: every backend implements [`drivers::Driver`]
//! - **Capability records**: each backend declares what it supports via [`drivers::Info`]
//! - **Directory pools**: bind-mount any host directory as a pool
//! - **Mount primitives**: busy-retrying mounts and bounded unmount loops
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use depot::drivers::{DriverRegistry, PoolConfig, State};
//! use depot_common::DepotPaths;
//!
//! # fn example() -> depot_common::DepotResult<()> {
//! let state = Arc::new(State::new(DepotPaths::with_root("/var/lib/depot")));
//! let registry = DriverRegistry::builtin();
//!
//! let mut config = PoolConfig::new();
//! config.insert("source".to_string(), "/mnt/data".to_string());
//!
//! let mut pool = registry.load(state, "dir", "data", config)?;
//! pool.create()?;
//! let mounted = pool.mount()?;
//! # let _ = mounted;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod drivers;
pub mod mount;

pub use drivers::{Driver, DriverRegistry};
