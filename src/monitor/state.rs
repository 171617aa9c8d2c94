//! Shared mutable monitor state.
//!
//! Everything both the monitoring loop and the command dispatcher touch
//! lives here behind one mutex: the latest metrics, the bounded alert
//! history, the cooldown table, the counters and the enabled flag.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::alerts::Alert;
use super::metrics::{CurrentMetrics, ResourceReading};

/// Maximum number of alerts kept in history; oldest evicted first
pub const ALERT_HISTORY_CAPACITY: usize = 100;

/// Monotonic monitoring counters, persisted across restarts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub checks_performed: u64,
    pub alerts_triggered: u64,
    pub notifications_sent: u64,
    pub started_at: DateTime<Utc>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            checks_performed: 0,
            alerts_triggered: 0,
            notifications_sent: 0,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<Mutex<MonitorState>>;

#[derive(Debug)]
pub struct MonitorState {
    pub current: CurrentMetrics,
    pub history: VecDeque<Alert>,
    /// "{resource}_{LEVEL}" -> epoch seconds of the last notification
    pub last_alert_times: HashMap<String, i64>,
    pub stats: Stats,
    pub enabled: bool,
}

impl MonitorState {
    /// Fresh state with monitoring enabled
    pub fn new() -> Self {
        Self {
            current: CurrentMetrics::default(),
            history: VecDeque::new(),
            last_alert_times: HashMap::new(),
            stats: Stats::default(),
            enabled: true,
        }
    }

    /// Per-tick bookkeeping: counts the check and refreshes the latest
    /// metrics, returning whether alert evaluation should run this tick.
    ///
    /// Runs on every tick regardless of the enabled flag so status
    /// queries stay live while monitoring is paused.
    pub fn begin_tick(&mut self, reading: &ResourceReading) -> bool {
        self.stats.checks_performed += 1;
        self.apply_reading(reading);
        self.enabled
    }

    fn apply_reading(&mut self, reading: &ResourceReading) {
        if let Some(cpu) = reading.cpu_percent {
            self.current.cpu_percent = cpu;
        }
        if let Some(memory) = reading.memory_percent {
            self.current.memory_percent = memory;
        }
        for disk in &reading.disks {
            if disk.mount_point == "/" {
                self.current.disk_percent = disk.usage_percent;
            }
        }
        if let Some(network) = &reading.network {
            self.current.network_sent_mbps = network.sent_mbps;
            self.current.network_recv_mbps = network.recv_mbps;
        }
    }

    /// Append an alert to history and decide whether it may be notified.
    ///
    /// The cooldown check and the timestamp update happen together under
    /// the caller's lock, so two near-simultaneous breaches of the same
    /// (resource, level) pair can never both pass.
    pub fn record_and_gate(&mut self, alert: &Alert, cooldown_secs: u64, now: DateTime<Utc>) -> bool {
        if self.history.len() >= ALERT_HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(alert.clone());
        self.stats.alerts_triggered += 1;

        let key = alert.cooldown_key();
        let now_secs = now.timestamp();
        if let Some(&last) = self.last_alert_times.get(&key) {
            if now_secs - last < cooldown_secs as i64 {
                return false;
            }
        }

        self.last_alert_times.insert(key, now_secs);
        true
    }

    /// The most recent `count` alerts, oldest first
    pub fn recent_alerts(&self, count: usize) -> Vec<Alert> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}
