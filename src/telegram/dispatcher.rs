//! Remote command handling.
//!
//! One table maps every inbound command to a read or mutate operation on
//! the shared [`Monitor`] handle and a formatted response. Unknown input
//! gets a friendly answer, never an error.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::broadcast;

use crate::monitor::Monitor;

/// Backoff after a failed getUpdates poll
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Delay before a full restart so the confirmation reaches the chat
const RESTART_NOTICE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Status,
    Stats,
    Alerts,
    Config,
    Enable,
    Disable,
    Restart,
    FullRestart,
    Unknown,
}

impl Command {
    /// Parse an inbound message. Accepts `/status`, `status` and the
    /// group-chat form `/status@botname`.
    pub fn parse(text: &str) -> Self {
        let token = text.trim().split_whitespace().next().unwrap_or("");
        let token = token.strip_prefix('/').unwrap_or(token);
        let token = token.split('@').next().unwrap_or(token);

        match token.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "status" => Command::Status,
            "stats" => Command::Stats,
            "alerts" => Command::Alerts,
            "config" => Command::Config,
            "enable" => Command::Enable,
            "disable" => Command::Disable,
            "restart" => Command::Restart,
            "full_restart" => Command::FullRestart,
            _ => Command::Unknown,
        }
    }
}

/// Execute a command against the monitor and format the response
pub async fn dispatch(monitor: &Arc<Monitor>, command: Command) -> String {
    match command {
        Command::Start | Command::Help => help_text(),
        Command::Status => format_status(monitor),
        Command::Stats => format_stats(monitor),
        Command::Alerts => format_alerts(monitor),
        Command::Config => format_config(monitor),
        Command::Enable => {
            monitor.set_enabled(true);
            "✅ Monitoring enabled".to_string()
        }
        Command::Disable => {
            monitor.set_enabled(false);
            "❌ Monitoring disabled".to_string()
        }
        Command::Restart => {
            monitor.restart().await;
            if monitor.is_running().await {
                "✅ Monitoring loop restarted".to_string()
            } else {
                "❌ Failed to restart the monitoring loop".to_string()
            }
        }
        Command::FullRestart => {
            let monitor = Arc::clone(monitor);
            tokio::spawn(async move {
                tokio::time::sleep(RESTART_NOTICE_DELAY).await;
                full_restart(&monitor);
            });
            "🔄 Restarting the application...".to_string()
        }
        Command::Unknown => {
            "Unknown command. Use /help for the list of commands.".to_string()
        }
    }
}

/// Poll for inbound commands until shutdown.
///
/// Each text message is parsed, dispatched and answered on its
/// originating chat. Poll failures are logged and retried after a short
/// backoff; they never take the process down.
pub async fn run_command_listener(monitor: Arc<Monitor>, mut shutdown: broadcast::Receiver<()>) {
    let client = monitor.client().clone();
    if !client.is_enabled() {
        info!("Telegram channel disabled, remote commands unavailable");
        return;
    }

    info!("Telegram command listener started");
    let mut offset = 0i64;

    loop {
        let updates = tokio::select! {
            result = client.get_updates(offset) => result,
            _ = shutdown.recv() => break,
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);

                    let Some(message) = update.message else {
                        continue;
                    };
                    let Some(text) = message.text else { continue };

                    let command = Command::parse(&text);
                    debug!("Inbound command: {command:?}");

                    let response = dispatch(&monitor, command).await;
                    if let Err(e) = client.reply(message.chat.id, &response).await {
                        warn!("Failed to reply to command: {e}");
                    }
                }
            }
            Err(e) => {
                warn!("Telegram poll failed: {e}");
                tokio::select! {
                    _ = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    _ = shutdown.recv() => break,
                }
            }
        }
    }

    info!("Telegram command listener stopped");
}

fn help_text() -> String {
    "🤖 <b>Host resource monitor</b>\n\n\
     Available commands:\n\
     /status - Current system state\n\
     /stats - Monitoring statistics\n\
     /alerts - Alert history\n\
     /config - Active thresholds\n\
     /enable - Enable monitoring\n\
     /disable - Disable monitoring\n\
     /restart - Restart the monitoring loop\n\
     /full_restart - Relaunch the whole application\n\
     /help - Show this help"
        .to_string()
}

fn format_status(monitor: &Arc<Monitor>) -> String {
    let (current, enabled) = {
        let state = monitor.state.lock();
        (state.current.clone(), state.enabled)
    };

    format!(
        "📊 <b>System status</b>\n\n\
         🖥️ <b>CPU:</b> {:.1}%\n\
         🧠 <b>Memory:</b> {:.1}%\n\
         💾 <b>Disk:</b> {:.1}%\n\
         📤 <b>Network out:</b> {:.2} MB/s\n\
         📥 <b>Network in:</b> {:.2} MB/s\n\n\
         🔧 <b>Monitoring:</b> {}\n\
         ⏰ <b>Uptime:</b> {}",
        current.cpu_percent,
        current.memory_percent,
        current.disk_percent,
        current.network_sent_mbps,
        current.network_recv_mbps,
        if enabled {
            "✅ enabled"
        } else {
            "❌ disabled"
        },
        format_uptime(monitor.uptime())
    )
}

fn format_stats(monitor: &Arc<Monitor>) -> String {
    let stats = monitor.state.lock().stats.clone();

    format!(
        "📈 <b>Monitoring statistics</b>\n\n\
         🔄 <b>Checks:</b> {}\n\
         ⚠️ <b>Alerts:</b> {}\n\
         📨 <b>Notifications sent:</b> {}\n\
         ⏰ <b>Uptime:</b> {}\n\
         📅 <b>Started:</b> {}",
        stats.checks_performed,
        stats.alerts_triggered,
        stats.notifications_sent,
        format_uptime(monitor.uptime()),
        stats.started_at.format("%Y-%m-%d %H:%M:%S")
    )
}

fn format_alerts(monitor: &Arc<Monitor>) -> String {
    let recent = monitor.state.lock().recent_alerts(10);
    if recent.is_empty() {
        return "📝 <b>Alert history</b>\n\nNo alerts recorded.".to_string();
    }

    let mut text = String::from("📝 <b>Alert history</b>\n\n");
    for alert in recent {
        text.push_str(&format!(
            "{} <b>{}</b> - {:.2} (threshold: {:.2})\n   <i>{}</i>\n\n",
            alert.level.emoji(),
            alert.resource,
            alert.value,
            alert.threshold,
            alert.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    text
}

fn format_config(monitor: &Arc<Monitor>) -> String {
    let config = monitor.config.read();
    let resources = &config.monitoring.resources;

    format!(
        "⚙️ <b>Monitoring configuration</b>\n\n\
         🖥️ <b>CPU threshold:</b> {:.0}%\n\
         🧠 <b>Memory threshold:</b> {:.0}%\n\
         💾 <b>Disk threshold:</b> {:.0}%\n\
         📤 <b>Outbound threshold:</b> {} MB/s\n\
         📥 <b>Inbound threshold:</b> {} MB/s",
        resources.cpu.threshold,
        resources.memory.threshold,
        resources.disk.threshold,
        resources.network.threshold_sent_mbps,
        resources.network.threshold_recv_mbps
    )
}

/// Persist state and replace this process with a fresh image running the
/// same arguments. In-flight tasks are not drained beyond the state save.
fn full_restart(monitor: &Arc<Monitor>) {
    info!("Full restart requested");

    if let Err(e) = monitor.persist() {
        error!("Failed to persist state before restart: {e}");
    }

    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            error!("Cannot determine current executable: {e}");
            return;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    match std::process::Command::new(exe).args(args).spawn() {
        Ok(_) => {
            info!("Replacement process spawned, exiting");
            std::process::exit(0);
        }
        Err(e) => error!("Failed to spawn replacement process: {e}"),
    }
}

/// Human-readable uptime as days, hours and minutes
fn format_uptime(uptime: Duration) -> String {
    let total_secs = uptime.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
