//! caclmgrd - Control-Plane ACL Manager Daemon Entry Point

use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use cacl_common::db::{spawn_change_listener, ConfigDb, RedisConfig};
use cacl_common::{CaclError, ConfigMgr};
use caclmgrd::{CaclMgr, ShellExecutor};

/// Initializes tracing/logging subsystem
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// The daemon rewrites the host firewall; anything less than root cannot.
fn check_privilege() -> Result<(), CaclError> {
    if nix::unistd::geteuid().is_root() {
        Ok(())
    } else {
        Err(CaclError::privilege("caclmgrd must run as root"))
    }
}

async fn run() -> anyhow::Result<()> {
    check_privilege()?;

    // Config store location from args, SONiC defaults otherwise
    let host = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1".to_string());
    let port = match std::env::args().nth(2) {
        Some(p) => p.parse::<u16>().context("invalid port argument")?,
        None => 6379,
    };

    let redis_config = RedisConfig::config_db(host, port);
    info!("Using config store {}", redis_config.uri());

    let source = ConfigDb::connect(redis_config.clone())
        .await
        .context("failed to reach the config store")?;

    let mut mgr = CaclMgr::new(source, ShellExecutor);

    let tables: Vec<String> = mgr
        .config_table_names()
        .iter()
        .map(|t| t.to_string())
        .collect();

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let _listener = spawn_change_listener(redis_config, tables, tx)
        .await
        .context("failed to subscribe to config changes")?;

    caclmgrd::watcher::run(&mut mgr, &mut rx).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    info!("--- Starting caclmgrd (Rust) ---");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("caclmgrd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
