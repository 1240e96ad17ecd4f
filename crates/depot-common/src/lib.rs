//! # depot-common
//!
//! Shared utilities and types for the Depot storage pool drivers.
//!
//! This crate provides functionality used by every driver:
//! - The managed storage root and per-pool mount paths
//! - Pool name sanitization and lexical path cleaning
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod paths;

pub use error::{DepotError, DepotResult};
pub use paths::{DepotPaths, clean_path, sanitize_pool_name};
