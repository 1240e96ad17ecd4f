//! Mount table inspection.

use std::path::{Path, PathBuf};

use depot_common::{DepotError, DepotResult};

/// Per-process mount table.
const MOUNTINFO: &str = "/proc/self/mountinfo";

/// Check whether `path` is currently a mount point.
///
/// The mount table is consulted so that bind mounts from the same device
/// are detected. A path that does not exist is not a mount point.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved.
pub fn is_mount_point(path: &Path) -> DepotResult<bool> {
    let resolved = match std::fs::canonicalize(path) {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(error) => {
            return Err(DepotError::Stat {
                path: path.to_path_buf(),
                error,
            });
        }
    };

    if let Ok(table) = std::fs::read_to_string(MOUNTINFO) {
        return Ok(mount_points(&table).any(|mp| mp == resolved));
    }

    device_boundary(&resolved)
}

/// Iterate the mount point column of a mountinfo table.
fn mount_points(table: &str) -> impl Iterator<Item = PathBuf> + '_ {
    table
        .lines()
        .filter_map(|line| line.split(' ').nth(4))
        .map(|field| PathBuf::from(unescape(field)))
}

/// Decode the `\ooo` octal escapes the kernel uses for whitespace and backslashes.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_escape(&bytes[i + 1..i + 4]) {
            let value = (bytes[i + 1] - b'0') * 64
                + (bytes[i + 2] - b'0') * 8
                + (bytes[i + 3] - b'0');
            out.push(value);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3 && digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}

/// Fallback when no mount table is readable: a mount point sits on a
/// different device than its parent, or is its own parent.
fn device_boundary(path: &Path) -> DepotResult<bool> {
    let Some(parent) = path.parent() else {
        return Ok(true);
    };

    let own = stat(path)?;
    let up = stat(parent)?;
    Ok(own.st_dev != up.st_dev || own.st_ino == up.st_ino)
}

/// Check whether two paths currently resolve to the same mounted filesystem
/// and the same directory within it.
///
/// Used to detect an already established bind mount; comparing path strings
/// is not enough since different strings can name the same mount. Paths that
/// cannot be inspected never match.
#[must_use]
pub fn same_mount(a: &Path, b: &Path) -> bool {
    let (Ok(fs_a), Ok(fs_b)) = (rustix::fs::statvfs(a), rustix::fs::statvfs(b)) else {
        return false;
    };
    if fs_a.f_fsid != fs_b.f_fsid {
        return false;
    }

    let (Ok(st_a), Ok(st_b)) = (stat(a), stat(b)) else {
        return false;
    };
    st_a.st_dev == st_b.st_dev && st_a.st_ino == st_b.st_ino
}

fn stat(path: &Path) -> DepotResult<rustix::fs::Stat> {
    rustix::fs::stat(path).map_err(|e| DepotError::Stat {
        path: path.to_path_buf(),
        error: e.into(),
    })
}
