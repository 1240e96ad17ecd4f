//! CLI command definitions and handlers.
//!
//! The CLI stands in for an orchestrator: pool configuration is passed on
//! the command line each time and the resulting configuration is printed
//! back as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use depot_common::{DepotPaths, DepotResult};
use serde_json::json;

use crate::drivers::{
    CONFIG_SOURCE, DriverRegistry, Operation, PoolConfig, State, validate_common,
};

/// Depot - storage pool drivers
#[derive(Parser)]
#[command(name = "depot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Managed storage root
    #[arg(
        long,
        global = true,
        env = "DEPOT_ROOT",
        default_value = "/var/lib/depot"
    )]
    pub root: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Seconds to wait for a single driver call
    #[arg(long, global = true, default_value_t = 120)]
    pub timeout: u64,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Pool commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List available drivers and their capabilities
    Drivers,

    /// Check a pool configuration
    Validate(PoolArgs),

    /// Provision a pool's backing storage
    Create(PoolArgs),

    /// Apply changed configuration keys to a pool
    Update {
        /// Pool to update.
        #[command(flatten)]
        pool: PoolArgs,

        /// Changed key (KEY=VALUE), repeatable
        #[arg(long = "set", value_parser = parse_key_val)]
        changed: Vec<(String, String)>,
    },

    /// Wipe and release a pool
    Delete(PoolArgs),

    /// Mount a pool
    Mount(PoolArgs),

    /// Unmount a pool
    Unmount(PoolArgs),

    /// Show pool capacity and usage
    Resources(PoolArgs),
}

/// Identifies a pool and its configuration.
#[derive(Args, Clone)]
pub struct PoolArgs {
    /// Pool name
    pub name: String,

    /// Storage driver
    #[arg(long, default_value = "dir")]
    pub driver: String,

    /// Configuration entry (KEY=VALUE), repeatable
    #[arg(short, long = "config", value_parser = parse_key_val)]
    pub config: Vec<(String, String)>,
}

impl PoolArgs {
    fn pool_config(&self) -> PoolConfig {
        self.config.iter().cloned().collect()
    }
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Progress handle that reports through tracing.
#[derive(Debug)]
struct TracingOperation {
    pool: String,
}

impl Operation for TracingOperation {
    fn update_progress(&self, stage: &str, percent: u8) {
        tracing::info!(pool = %self.pool, stage, percent, "Progress");
    }
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver call fails or times out.
    pub async fn execute(self) -> Result<()> {
        let state = Arc::new(State::new(DepotPaths::with_root(&self.root)));
        let registry = DriverRegistry::builtin();
        let timeout = Duration::from_secs(self.timeout);

        let output = self.command.run(state, &registry, timeout).await?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

impl Commands {
    /// Run the command and return its JSON report.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver call fails or times out.
    pub async fn run(
        self,
        state: Arc<State>,
        registry: &DriverRegistry,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        let output = match self {
            Self::Drivers => serde_json::to_value(registry.supported())?,

            Self::Validate(args) => {
                let config = args.pool_config();
                let driver = registry.load(state, &args.driver, &args.name, config.clone())?;
                run_blocking(timeout, move || {
                    validate_common(&config)?;
                    driver.validate(&config)
                })
                .await?;
                json!({ "pool": args.name, "valid": true })
            }

            Self::Create(args) => {
                let config = args.pool_config();
                // Self-managed pools use the mount path itself, which the
                // driver expects to exist already.
                let has_source = config.get(CONFIG_SOURCE).is_some_and(|s| !s.is_empty());
                let mount_path = if has_source {
                    None
                } else {
                    Some(state.paths.pool_mount_path(&args.name)?)
                };
                let mut driver =
                    registry.load(state, &args.driver, &args.name, config.clone())?;
                let driver = run_blocking(timeout, move || {
                    validate_common(&config)?;
                    driver.validate(&config)?;
                    if let Some(path) = mount_path {
                        std::fs::create_dir_all(&path)?;
                    }
                    driver.create()?;
                    Ok(driver)
                })
                .await?;
                json!({ "pool": args.name, "config": driver.config() })
            }

            Self::Update { pool, changed } => {
                let changed: PoolConfig = changed.into_iter().collect();
                let mut config = pool.pool_config();
                config.extend(changed.clone());
                let mut driver = registry.load(state, &pool.driver, &pool.name, config)?;
                let driver = run_blocking(timeout, move || {
                    validate_common(driver.config())?;
                    driver.validate(driver.config())?;
                    driver.update(&changed)?;
                    Ok(driver)
                })
                .await?;
                json!({ "pool": pool.name, "config": driver.config() })
            }

            Self::Delete(args) => {
                let driver = registry.load(state, &args.driver, &args.name, args.pool_config())?;
                let op = TracingOperation {
                    pool: args.name.clone(),
                };
                run_blocking(timeout, move || driver.delete(&op)).await?;
                json!({ "pool": args.name, "deleted": true })
            }

            Self::Mount(args) => {
                let driver = registry.load(state, &args.driver, &args.name, args.pool_config())?;
                let mounted = run_blocking(timeout, move || driver.mount()).await?;
                json!({ "pool": args.name, "mounted": mounted })
            }

            Self::Unmount(args) => {
                let driver = registry.load(state, &args.driver, &args.name, args.pool_config())?;
                let unmounted = run_blocking(timeout, move || driver.unmount()).await?;
                json!({ "pool": args.name, "unmounted": unmounted })
            }

            Self::Resources(args) => {
                let driver = registry.load(state, &args.driver, &args.name, args.pool_config())?;
                let resources = run_blocking(timeout, move || driver.get_resources()).await?;
                json!({ "pool": args.name, "resources": resources })
            }
        };

        Ok(output)
    }
}

/// Run a blocking driver call on its own thread, bounded by `timeout`.
///
/// A call that times out keeps running on its thread; only the wait ends.
async fn run_blocking<T, F>(timeout: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> DepotResult<T> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    let joined = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| eyre!("driver call timed out after {}s", timeout.as_secs()))?;
    let result = joined.wrap_err("driver call panicked")?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_values() {
        assert_eq!(
            parse_key_val("source=/mnt/data").unwrap(),
            ("source".to_string(), "/mnt/data".to_string())
        );
        assert_eq!(
            parse_key_val("source=").unwrap(),
            ("source".to_string(), String::new())
        );
        assert!(parse_key_val("source").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn cli_parses_pool_args() {
        let cli = Cli::try_parse_from([
            "depot", "--root", "/tmp/d", "mount", "data", "-c", "source=/mnt/data",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("/tmp/d"));
        let Commands::Mount(args) = cli.command else {
            panic!("expected mount");
        };
        assert_eq!(args.driver, "dir");
        assert_eq!(
            args.pool_config().get("source").map(String::as_str),
            Some("/mnt/data")
        );
    }

    async fn run(root: &std::path::Path, args: &[&str]) -> serde_json::Value {
        let command = Cli::try_parse_from(args).unwrap().command;
        let state = Arc::new(State::new(DepotPaths::with_root(root)));
        command
            .run(state, &DriverRegistry::builtin(), Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_without_source_makes_pool_path() {
        let dir = tempfile::tempdir().unwrap();
        let output = run(dir.path(), &["depot", "create", "default"]).await;

        let pool_path = DepotPaths::with_root(dir.path())
            .pool_mount_path("default")
            .unwrap();
        assert!(pool_path.is_dir());
        assert_eq!(output["config"]["source"], pool_path.display().to_string());
    }

    #[tokio::test]
    async fn update_reports_changed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("data");
        std::fs::create_dir(&source).unwrap();
        let source_arg = format!("source={}", source.display());

        let output = run(
            &dir.path().join("depot"),
            &["depot", "update", "data", "-c", &source_arg, "--set", "size=10GiB"],
        )
        .await;

        assert_eq!(output["config"]["size"], "10GiB");
        assert_eq!(output["config"]["source"], source.display().to_string());
    }

    #[tokio::test]
    async fn blocking_call_times_out() {
        let err = run_blocking(Duration::from_millis(10), || {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn blocking_call_returns_value() {
        let value = run_blocking(Duration::from_secs(5), || Ok(7)).await.unwrap();
        assert_eq!(value, 7);
    }
}
