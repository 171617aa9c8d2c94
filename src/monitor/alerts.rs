//! Alert types and threshold evaluation.
//!
//! Evaluates a resource reading against configured thresholds and
//! generates alerts. Notification gating (cooldowns) happens later in
//! [`super::state::MonitorState`]; evaluation itself never suppresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MonitoringConfig;

use super::metrics::ResourceReading;

/// Usage percentage above which a breach is Critical instead of Warning
const CRITICAL_USAGE_PERCENT: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
    Error,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "INFO",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Critical => "CRITICAL",
            AlertLevel::Error => "ERROR",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertLevel::Info => "ℹ️",
            AlertLevel::Warning => "⚠️",
            AlertLevel::Critical => "🚨",
            AlertLevel::Error => "❌",
        }
    }
}

/// An individual alert. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub resource: String,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    fn new(level: AlertLevel, resource: &str, message: &str, value: f64, threshold: f64) -> Self {
        Self {
            level,
            resource: resource.to_string(),
            message: message.to_string(),
            value,
            threshold,
            timestamp: Utc::now(),
        }
    }

    /// Key under which this alert's cooldown is tracked and persisted
    pub fn cooldown_key(&self) -> String {
        format!("{}_{}", self.resource, self.level.as_str())
    }

    /// Outbound notification body (Telegram HTML)
    pub fn notification_text(&self) -> String {
        format!(
            "{} <b>{} - {}</b>\n\
             📊 Value: {:.2}\n\
             📈 Threshold: {:.2}\n\
             ⏰ Time: {}\n\
             📝 {}",
            self.level.emoji(),
            self.resource,
            self.level.as_str(),
            self.value,
            self.threshold,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

fn usage_level(value: f64) -> AlertLevel {
    if value > CRITICAL_USAGE_PERCENT {
        AlertLevel::Critical
    } else {
        AlertLevel::Warning
    }
}

/// Evaluate one reading and generate alerts for every breaching resource.
///
/// All comparisons are strict greater-than: a reading exactly at its
/// threshold never fires. Network breaches are always Warning.
pub fn evaluate_alerts(reading: &ResourceReading, config: &MonitoringConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let resources = &config.resources;

    if resources.cpu.enabled {
        if let Some(cpu) = reading.cpu_percent {
            if cpu > resources.cpu.threshold {
                alerts.push(Alert::new(
                    usage_level(cpu),
                    "CPU",
                    "CPU usage exceeded threshold",
                    cpu,
                    resources.cpu.threshold,
                ));
            }
        }
    }

    if resources.memory.enabled {
        if let Some(memory) = reading.memory_percent {
            if memory > resources.memory.threshold {
                alerts.push(Alert::new(
                    usage_level(memory),
                    "Memory",
                    "Memory usage exceeded threshold",
                    memory,
                    resources.memory.threshold,
                ));
            }
        }
    }

    if resources.disk.enabled {
        for disk in &reading.disks {
            if disk.usage_percent > resources.disk.threshold {
                alerts.push(Alert::new(
                    usage_level(disk.usage_percent),
                    &format!("Disk {}", disk.mount_point),
                    "Disk usage exceeded threshold",
                    disk.usage_percent,
                    resources.disk.threshold,
                ));
            }
        }
    }

    if resources.network.enabled {
        if let Some(network) = &reading.network {
            if network.sent_mbps > resources.network.threshold_sent_mbps {
                alerts.push(Alert::new(
                    AlertLevel::Warning,
                    "Network (outbound)",
                    "Outbound throughput exceeded threshold",
                    network.sent_mbps,
                    resources.network.threshold_sent_mbps,
                ));
            }

            if network.recv_mbps > resources.network.threshold_recv_mbps {
                alerts.push(Alert::new(
                    AlertLevel::Warning,
                    "Network (inbound)",
                    "Inbound throughput exceeded threshold",
                    network.recv_mbps,
                    resources.network.threshold_recv_mbps,
                ));
            }
        }
    }

    alerts
}
