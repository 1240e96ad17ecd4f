//! Mount primitives used by the pool drivers.
//!
//! This module handles:
//! - Bind mounting with busy retries
//! - Unmounting until a path is clear
//! - Mount point and mount identity checks

mod info;
mod ops;

pub use info::{is_mount_point, same_mount};
pub use ops::{FORCE_UNMOUNT_ROUNDS, UnmountFlags, force_unmount, try_mount, try_unmount};
