//! Monitoring loop orchestration.
//!
//! One background task drives periodic sampling; the command dispatcher
//! shares the [`Monitor`] handle to read live state, flip the enabled
//! flag and restart the loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::FutureExt;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::error::Result;
use crate::persist::{self, PersistedState};
use crate::telegram::TelegramClient;

use super::alerts::evaluate_alerts;
use super::collector::MetricsCollector;
use super::state::{MonitorState, SharedState};

/// Grace period when waiting for the loop task to finish after a stop
const STOP_GRACE: Duration = Duration::from_secs(10);

/// Handle to the monitoring subsystem.
///
/// Owns all shared state; clones of the `Arc` are handed to the loop
/// task and the command listener.
pub struct Monitor {
    pub state: SharedState,
    pub config: Arc<RwLock<Config>>,
    client: TelegramClient,
    state_path: PathBuf,
    started: Instant,
    task: tokio::sync::Mutex<Option<LoopTask>>,
}

struct LoopTask {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl Monitor {
    pub fn new(
        config: Config,
        state: MonitorState,
        client: TelegramClient,
        state_path: PathBuf,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(state)),
            config: Arc::new(RwLock::new(config)),
            client,
            state_path,
            started: Instant::now(),
            task: tokio::sync::Mutex::new(None),
        })
    }

    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    /// Time since this process started
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Flip alert generation on or off. Takes effect on the next tick.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
        info!(
            "Monitoring {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Whether the loop task is currently alive
    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }

    /// Spawn the monitoring loop. A no-op when it is already running.
    pub async fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().await;
        if let Some(running) = task.as_ref() {
            if !running.handle.is_finished() {
                warn!("Monitoring loop already running");
                return;
            }
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            monitor_loop(monitor, shutdown_rx).await;
        });

        *task = Some(LoopTask {
            shutdown_tx,
            handle,
        });
        info!("Monitoring started");
    }

    /// Signal the loop to stop and wait up to the grace period for the
    /// in-flight tick to finish.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        if let Some(running) = task.take() {
            let _ = running.shutdown_tx.send(());
            match tokio::time::timeout(STOP_GRACE, running.handle).await {
                Ok(_) => info!("Monitoring stopped"),
                Err(_) => warn!("Monitoring loop did not stop within the grace period"),
            }
        }
    }

    /// Stop-then-start cycle preserving history, counters and cooldowns
    pub async fn restart(self: &Arc<Self>) {
        info!("Restarting monitoring loop");
        self.stop().await;
        self.start().await;
    }

    /// Write a snapshot of history, counters and cooldowns to disk
    pub fn persist(&self) -> Result<()> {
        let snapshot = {
            let state = self.state.lock();
            PersistedState::from_state(&state)
        };
        persist::save_state(&self.state_path, &snapshot)
    }
}

async fn monitor_loop(monitor: Arc<Monitor>, mut shutdown: broadcast::Receiver<()>) {
    let check_interval = monitor
        .config
        .read()
        .monitoring
        .check_interval_seconds
        .max(1);
    info!("Monitoring loop started with a {check_interval}s interval");

    let mut collector = MetricsCollector::new();
    // CPU usage is measured between consecutive refreshes; give sysinfo
    // its minimum window before the first reading.
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;

    let mut ticker = interval(Duration::from_secs(check_interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A panic escaping the tick body ends monitoring, not the
                // process; commands keep working until an explicit restart.
                let tick = AssertUnwindSafe(run_tick(&monitor, &mut collector)).catch_unwind();
                let failure = match tick.await {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(e.to_string()),
                    Err(panic) => Some(panic_message(panic)),
                };

                if let Some(reason) = failure {
                    error!("Unrecoverable monitoring error: {reason}");
                    let text = format!(
                        "❌ <b>Monitoring failure</b>\nError: {reason}\nTime: {}",
                        Utc::now().format("%Y-%m-%d %H:%M:%S")
                    );
                    if let Err(send_err) = monitor.client.send_message(&text).await {
                        warn!("Failed to report monitoring failure: {send_err}");
                    }
                    break;
                }
            }
            _ = shutdown.recv() => {
                info!("Monitoring loop shutting down");
                break;
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "tick panicked".to_string()
    }
}

async fn run_tick(monitor: &Arc<Monitor>, collector: &mut MetricsCollector) -> Result<()> {
    let monitoring = monitor.config.read().monitoring.clone();
    let reading = collector.collect(&monitoring.resources);

    let enabled = monitor.state.lock().begin_tick(&reading);
    if !enabled {
        debug!("Monitoring disabled, skipping evaluation");
        return Ok(());
    }

    let alerts = evaluate_alerts(&reading, &monitoring);
    if alerts.is_empty() {
        info!("All resources within thresholds");
        return Ok(());
    }
    warn!("{} threshold breach(es) detected", alerts.len());

    let cooldown_secs = monitoring.notification_cooldown_seconds;
    for alert in alerts {
        let should_notify = monitor
            .state
            .lock()
            .record_and_gate(&alert, cooldown_secs, Utc::now());
        if !should_notify {
            debug!("Notification for {} suppressed by cooldown", alert.resource);
            continue;
        }

        match monitor.client.send_message(&alert.notification_text()).await {
            Ok(true) => {
                monitor.state.lock().stats.notifications_sent += 1;
            }
            Ok(false) => {}
            Err(e) => warn!("Alert delivery failed: {e}"),
        }
    }

    Ok(())
}
