//! Directory driver lifecycle tests through the registry.
//!
//! Tests that bind mount need root and the `integration` feature.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use depot::drivers::{Driver, DriverRegistry, NoopOperation, PoolConfig, State};
use depot_common::{DepotError, DepotPaths};
use tempfile::TempDir;

struct Host {
    dir: TempDir,
    paths: DepotPaths,
    registry: DriverRegistry,
}

impl Host {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let paths = DepotPaths::with_root(dir.path().join("depot"));
        paths.create_dirs().unwrap();
        Self {
            dir,
            paths,
            registry: DriverRegistry::builtin(),
        }
    }

    fn external(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("mnt").join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn pool(&self, name: &str, source: Option<&Path>) -> Box<dyn Driver> {
        let mut config = PoolConfig::new();
        if let Some(source) = source {
            config.insert("source".to_string(), source.display().to_string());
        }
        let state = Arc::new(State::new(self.paths.clone()));
        self.registry.load(state, "dir", name, config).unwrap()
    }
}

#[test_log::test]
fn self_managed_pool_lifecycle() {
    let host = Host::new();
    let pool_path = host.paths.pool_mount_path("default").unwrap();
    fs::create_dir(&pool_path).unwrap();

    let mut pool = host.pool("default", None);
    pool.create().unwrap();
    assert_eq!(
        pool.config().get("source").map(PathBuf::from),
        Some(pool_path.clone())
    );

    // Later calls are made with the persisted config.
    let pool = host.pool("default", Some(pool_path.as_path()));
    assert!(!pool.mount().unwrap());
    assert!(!pool.mount().unwrap());

    fs::write(pool_path.join("volume.img"), "data").unwrap();
    let res = pool.get_resources().unwrap();
    assert!(res.space.total > 0);
    assert!(res.space.used <= res.space.total);

    assert!(!pool.unmount().unwrap());
    pool.delete(&NoopOperation).unwrap();
    assert_eq!(fs::read_dir(&pool_path).unwrap().count(), 0);
}

#[test_log::test]
fn non_empty_source_is_rejected() {
    let host = Host::new();
    let source = host.external("data");
    fs::write(source.join("a.txt"), "x").unwrap();

    let mut pool = host.pool("bad", Some(source.as_path()));
    let err = pool.create().unwrap_err();
    assert!(matches!(err, DepotError::SourceNotEmpty { .. }));
    assert_eq!(
        err.to_string(),
        format!("Source path '{}' isn't empty", source.display())
    );
}

#[test_log::test]
fn source_in_another_pool_is_rejected() {
    let host = Host::new();
    let other = host.paths.pool_mount_path("other").unwrap();
    fs::create_dir(&other).unwrap();

    let mut pool = host.pool("data", Some(other.as_path()));
    let err = pool.create().unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Source path '{}' is within the managed storage directory",
            other.display()
        )
    );
}

#[test_log::test]
fn unmounting_a_never_mounted_pool() {
    let host = Host::new();
    let source = host.external("data");
    let pool = host.pool("data", Some(source.as_path()));
    assert!(!pool.unmount().unwrap());
}

#[cfg(feature = "integration")]
mod privileged {
    use super::*;
    use depot::mount::{FORCE_UNMOUNT_ROUNDS, force_unmount, is_mount_point, try_mount};

    fn is_root() -> bool {
        rustix::process::geteuid().is_root()
    }

    #[test_log::test]
    fn bind_mount_round_trip() {
        if !is_root() {
            eprintln!("skipping: requires root");
            return;
        }

        let host = Host::new();
        let source = host.external("data");
        let target = host.paths.pool_mount_path("data").unwrap();

        let mut pool = host.pool("data", Some(source.as_path()));
        pool.create().unwrap();

        assert!(pool.mount().unwrap());
        assert!(is_mount_point(&target).unwrap());
        assert!(!pool.mount().unwrap());

        fs::write(target.join("visible"), "x").unwrap();
        assert!(source.join("visible").exists());

        assert!(pool.unmount().unwrap());
        assert!(!is_mount_point(&target).unwrap());
        assert!(!pool.unmount().unwrap());
    }

    #[test_log::test]
    fn delete_wipes_source_and_unmounts() {
        if !is_root() {
            eprintln!("skipping: requires root");
            return;
        }

        let host = Host::new();
        let source = host.external("data");
        let target = host.paths.pool_mount_path("data").unwrap();

        let mut pool = host.pool("data", Some(source.as_path()));
        pool.create().unwrap();
        assert!(pool.mount().unwrap());
        fs::create_dir_all(target.join("containers/c1")).unwrap();

        pool.delete(&NoopOperation).unwrap();

        assert!(!is_mount_point(&target).unwrap());
        assert_eq!(fs::read_dir(&source).unwrap().count(), 0);
    }

    #[test_log::test]
    fn bounded_unmount_reports_stuck_mount() {
        if !is_root() {
            eprintln!("skipping: requires root");
            return;
        }

        let host = Host::new();
        let source = host.external("stacked");
        let target = host.paths.pool_mount_path("stacked").unwrap();

        for _ in 0..FORCE_UNMOUNT_ROUNDS + 5 {
            try_mount(&source, &target).unwrap();
        }

        let err = force_unmount(&target).unwrap_err();
        assert!(
            matches!(err, DepotError::StillMounted { attempts, .. } if attempts == FORCE_UNMOUNT_ROUNDS),
            "{err}"
        );
        assert!(is_mount_point(&target).unwrap());

        assert!(force_unmount(&target).unwrap());
        assert!(!is_mount_point(&target).unwrap());
    }
}
