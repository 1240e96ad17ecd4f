//! Mount and unmount operations.

use std::path::Path;
use std::thread;
use std::time::Duration;

use depot_common::{DepotError, DepotResult};

use super::is_mount_point;

/// Attempts made on `EBUSY` before giving up.
const BUSY_RETRIES: usize = 20;

/// Pause between busy retries.
const BUSY_BACKOFF: Duration = Duration::from_millis(500);

/// Rounds of unmounting before a path is reported as stuck.
pub const FORCE_UNMOUNT_ROUNDS: usize = 20;

/// Unmount flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmountFlags {
    /// Lazy unmount (detach).
    pub detach: bool,
}

impl UnmountFlags {
    /// Flags for a lazy unmount.
    #[must_use]
    pub const fn detach() -> Self {
        Self { detach: true }
    }
}

/// Bind mount `source` onto `target`, creating `target` if needed.
///
/// No propagation flags are applied. A busy target is retried a bounded
/// number of times.
///
/// # Errors
///
/// Returns [`DepotError::Mount`] carrying both paths if the mount fails.
#[cfg(target_os = "linux")]
pub fn try_mount(source: &Path, target: &Path) -> DepotResult<()> {
    use rustix::io::Errno;
    use rustix::mount::mount_bind;

    if !target.exists() {
        std::fs::create_dir_all(target).map_err(|error| DepotError::Mount {
            source_path: source.to_path_buf(),
            target: target.to_path_buf(),
            error,
        })?;
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            attempt,
            "Creating bind mount"
        );

        match mount_bind(source, target) {
            Ok(()) => break,
            Err(Errno::BUSY) if attempt < BUSY_RETRIES => thread::sleep(BUSY_BACKOFF),
            Err(e) => {
                return Err(DepotError::Mount {
                    source_path: source.to_path_buf(),
                    target: target.to_path_buf(),
                    error: e.into(),
                });
            }
        }
    }

    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        "Bind mount created successfully"
    );
    Ok(())
}

/// Bind mounts are only available on Linux.
///
/// # Errors
///
/// Always returns [`DepotError::Unsupported`].
#[cfg(not(target_os = "linux"))]
pub fn try_mount(_source: &Path, _target: &Path) -> DepotResult<()> {
    Err(DepotError::Unsupported {
        feature: "bind mounts".to_string(),
    })
}

/// Unmount `target`, retrying while the kernel reports it busy.
///
/// # Errors
///
/// Returns [`DepotError::Unmount`] if the unmount fails for any other reason
/// or stays busy after every retry.
#[cfg(target_os = "linux")]
pub fn try_unmount(target: &Path, flags: UnmountFlags) -> DepotResult<()> {
    use rustix::io::Errno;
    use rustix::mount::{UnmountFlags as RustixUnmountFlags, unmount};

    let rflags = if flags.detach {
        RustixUnmountFlags::DETACH
    } else {
        RustixUnmountFlags::empty()
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        tracing::debug!(target = %target.display(), ?flags, attempt, "Unmounting filesystem");

        match unmount(target, rflags) {
            Ok(()) => return Ok(()),
            Err(Errno::BUSY) if attempt < BUSY_RETRIES => thread::sleep(BUSY_BACKOFF),
            Err(e) => {
                return Err(DepotError::Unmount {
                    target: target.to_path_buf(),
                    error: e.into(),
                });
            }
        }
    }
}

/// Unmounting is only available on Linux.
///
/// # Errors
///
/// Always returns [`DepotError::Unsupported`].
#[cfg(not(target_os = "linux"))]
pub fn try_unmount(_target: &Path, _flags: UnmountFlags) -> DepotResult<()> {
    Err(DepotError::Unsupported {
        feature: "unmount".to_string(),
    })
}

/// Unmount `target` until it is no longer a mount point.
///
/// Stacked mounts are peeled off one per round. Each round tries a clean
/// unmount first and falls back to a lazy one. Returns `true` if anything
/// was unmounted; a path that was never mounted yields `false`.
///
/// # Errors
///
/// Returns [`DepotError::StillMounted`] if the path is still a mount point
/// after [`FORCE_UNMOUNT_ROUNDS`] rounds, or the lazy unmount's error.
pub fn force_unmount(target: &Path) -> DepotResult<bool> {
    let mut unmounted = false;

    for _ in 0..FORCE_UNMOUNT_ROUNDS {
        if !is_mount_point(target)? {
            return Ok(unmounted);
        }

        if let Err(err) = try_unmount(target, UnmountFlags::default()) {
            // Someone else may have unmounted it between the check and the call.
            if !is_mount_point(target)? {
                return Ok(unmounted);
            }
            tracing::warn!(
                target = %target.display(),
                error = %err,
                "Clean unmount failed, falling back to lazy unmount"
            );
            try_unmount(target, UnmountFlags::detach())?;
        }
        unmounted = true;
    }

    if is_mount_point(target)? {
        return Err(DepotError::StillMounted {
            target: target.to_path_buf(),
            attempts: FORCE_UNMOUNT_ROUNDS,
        });
    }

    Ok(unmounted)
}
