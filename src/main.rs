use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use log::{error, info};
use tokio::sync::broadcast;

use resmon::config::Config;
use resmon::monitor::Monitor;
use resmon::persist;
use resmon::telegram::{run_command_listener, TelegramClient};

fn main() -> Result<()> {
    let matches = Command::new("resmon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Host resource monitor with threshold alerts and Telegram remote control")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Path to the configuration file")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("state")
                .short('s')
                .long("state")
                .value_name("PATH")
                .help("Path to the persisted state file")
                .default_value("monitor_state.json"),
        )
        .get_matches();

    let config_path = PathBuf::from(matches.get_one::<String>("config").unwrap());
    let state_path = PathBuf::from(matches.get_one::<String>("state").unwrap());

    let config = Config::load(&config_path);
    resmon::init_logging(config.log_level());
    info!("resmon {} starting", env!("CARGO_PKG_VERSION"));
    info!("Using configuration from {}", config_path.display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("resmon-worker")
        .build()
        .context("Failed to build async runtime")?;

    runtime.block_on(run(config, state_path))
}

async fn run(config: Config, state_path: PathBuf) -> Result<()> {
    let state = persist::load_state(&state_path).into_state();
    let client = TelegramClient::new(config.notifications.telegram.clone());
    let monitor = Monitor::new(config, state, client, state_path);

    monitor.start().await;

    let (shutdown_tx, _) = broadcast::channel(1);
    let listener = tokio::spawn(run_command_listener(
        Arc::clone(&monitor),
        shutdown_tx.subscribe(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for the interrupt signal")?;
    info!("Interrupt received, shutting down");

    let _ = shutdown_tx.send(());
    monitor.stop().await;

    if let Err(e) = monitor.persist() {
        error!("Failed to save state on shutdown: {e}");
    }

    // The listener leaves its long-poll as soon as the shutdown signal
    // lands; don't wait longer than that is worth.
    let _ = tokio::time::timeout(Duration::from_secs(5), listener).await;

    Ok(())
}
