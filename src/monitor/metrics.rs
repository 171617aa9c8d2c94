use serde::{Deserialize, Serialize};

/// Latest observed metrics snapshot, overwritten on every tick and read
/// by the command dispatcher for status queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    /// Usage of the root mount
    pub disk_percent: f64,
    pub network_sent_mbps: f64,
    pub network_recv_mbps: f64,
}

/// One tick's worth of raw readings handed to alert evaluation.
///
/// A category that is disabled or failed to read is absent; evaluation
/// skips what is not there.
#[derive(Debug, Clone, Default)]
pub struct ResourceReading {
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub disks: Vec<DiskReading>,
    pub network: Option<NetworkReading>,
}

#[derive(Debug, Clone)]
pub struct DiskReading {
    pub mount_point: String,
    pub usage_percent: f64,
}

/// Throughput over the last sampling window, in MB/s.
#[derive(Debug, Clone, Default)]
pub struct NetworkReading {
    pub sent_mbps: f64,
    pub recv_mbps: f64,
}
