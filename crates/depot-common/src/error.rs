//! Common error types for the Depot storage drivers.
//!
//! The display strings of the source-path precondition errors are relied on
//! by existing tooling and must not change.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`DepotError`].
pub type DepotResult<T> = Result<T, DepotError>;

/// Errors returned by pool drivers and their helpers.
#[derive(Error, Diagnostic, Debug)]
pub enum DepotError {
    /// Configured source path does not exist.
    #[error("Source path '{}' doesn't exist", .path.display())]
    #[diagnostic(
        code(depot::source::not_found),
        help("Create the directory before creating the pool")
    )]
    SourceNotFound {
        /// The configured source path.
        path: PathBuf,
    },

    /// Configured source path lives inside another pool's managed area.
    #[error("Source path '{}' is within the managed storage directory", .path.display())]
    #[diagnostic(
        code(depot::source::managed),
        help("Leave `source` unset to use the pool's own directory, or pick a path outside the managed root")
    )]
    SourceInManagedDir {
        /// The configured source path.
        path: PathBuf,
    },

    /// Configured source path already has entries.
    #[error("Source path '{}' isn't empty", .path.display())]
    #[diagnostic(code(depot::source::not_empty))]
    SourceNotEmpty {
        /// The configured source path.
        path: PathBuf,
    },

    /// Pool name cannot be turned into a path.
    #[error("Invalid pool name '{name}': {reason}")]
    #[diagnostic(
        code(depot::pool::invalid_name),
        help("Pool names must be non-empty and cannot contain '/', NUL, or be '.' or '..'")
    )]
    InvalidPoolName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// No driver registered under this name.
    #[error("Unknown storage driver: {name}")]
    #[diagnostic(code(depot::driver::unknown))]
    UnknownDriver {
        /// The requested driver name.
        name: String,
    },

    /// Mount syscall failed.
    #[error("Failed to mount '{}' on '{}': {error}", .source_path.display(), .target.display())]
    #[diagnostic(code(depot::mount))]
    Mount {
        /// Mount source.
        source_path: PathBuf,
        /// Mount target.
        target: PathBuf,
        /// Underlying OS error.
        #[source]
        error: std::io::Error,
    },

    /// Unmount syscall failed.
    #[error("Failed to unmount '{}': {error}", .target.display())]
    #[diagnostic(code(depot::unmount))]
    Unmount {
        /// Mount target.
        target: PathBuf,
        /// Underlying OS error.
        #[source]
        error: std::io::Error,
    },

    /// Path stayed mounted after the bounded number of unmount rounds.
    #[error("Path '{}' is still mounted after {attempts} unmount attempts", .target.display())]
    #[diagnostic(
        code(depot::unmount::busy),
        help("Check for processes holding files open below the mount")
    )]
    StillMounted {
        /// Mount target.
        target: PathBuf,
        /// Number of rounds attempted.
        attempts: usize,
    },

    /// stat/statvfs failed.
    #[error("Failed to stat '{}': {error}", .path.display())]
    #[diagnostic(code(depot::stat))]
    Stat {
        /// Path being inspected.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        error: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(depot::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(depot::serialization))]
    Serialization(String),

    /// Feature not supported on this platform.
    #[error("Feature not supported: {feature}")]
    #[diagnostic(code(depot::unsupported), help("Storage pool mounts require Linux"))]
    Unsupported {
        /// The unsupported feature.
        feature: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(depot::config))]
    Config {
        /// The error message.
        message: String,
    },
}

impl From<serde_json::Error> for DepotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_messages_are_stable() {
        let path = PathBuf::from("/mnt/data");
        assert_eq!(
            DepotError::SourceNotFound { path: path.clone() }.to_string(),
            "Source path '/mnt/data' doesn't exist"
        );
        assert_eq!(
            DepotError::SourceInManagedDir { path: path.clone() }.to_string(),
            "Source path '/mnt/data' is within the managed storage directory"
        );
        assert_eq!(
            DepotError::SourceNotEmpty { path }.to_string(),
            "Source path '/mnt/data' isn't empty"
        );
    }

    #[test]
    fn mount_error_names_both_paths() {
        let err = DepotError::Mount {
            source_path: PathBuf::from("/mnt/data"),
            target: PathBuf::from("/var/lib/depot/storage-pools/data"),
            error: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("/mnt/data"));
        assert!(msg.contains("/var/lib/depot/storage-pools/data"));
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DepotError = io_err.into();
        assert!(matches!(err, DepotError::Io(_)));
    }
}
