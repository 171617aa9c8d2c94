use std::time::Instant;

use log::warn;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};

use crate::config::ResourcesConfig;
use crate::error::{MonitorError, Result};

use super::metrics::{DiskReading, NetworkReading, ResourceReading};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Collects resource readings from the host.
///
/// The sysinfo handles are kept across ticks: CPU usage is measured
/// between consecutive refreshes and network throughput is derived from
/// the previous tick's cumulative counters.
pub struct MetricsCollector {
    system: System,
    disks: Disks,
    networks: Networks,
    last_network_update: Instant,
    last_network_totals: (u64, u64), // (sent, recv) cumulative bytes
}

impl MetricsCollector {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());

        let system = System::new_with_specifics(refresh_kind);
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        let last_network_totals = network_totals(&networks);

        Self {
            system,
            disks,
            networks,
            last_network_update: Instant::now(),
            last_network_totals,
        }
    }

    /// Collect one reading for the enabled resource categories.
    ///
    /// A category that fails to read is logged and left out of the
    /// reading; the remaining categories still contribute.
    pub fn collect(&mut self, resources: &ResourcesConfig) -> ResourceReading {
        // Refresh system data
        self.system.refresh_all();

        let mut reading = ResourceReading::default();

        if resources.cpu.enabled {
            reading.cpu_percent = Some(self.collect_cpu());
        }

        if resources.memory.enabled {
            match self.collect_memory() {
                Ok(memory) => reading.memory_percent = Some(memory),
                Err(e) => warn!("Memory check failed: {e}"),
            }
        }

        if resources.disk.enabled {
            reading.disks = self.collect_disks(&resources.disk.paths);
        }

        if resources.network.enabled {
            reading.network = Some(self.collect_network());
        }

        reading
    }

    fn collect_cpu(&self) -> f64 {
        self.system.global_cpu_usage() as f64
    }

    fn collect_memory(&self) -> Result<f64> {
        let total = self.system.total_memory();
        if total == 0 {
            return Err(MonitorError::metric_collection(
                "total memory reported as zero",
            ));
        }

        Ok(self.system.used_memory() as f64 / total as f64 * 100.0)
    }

    /// Usage for the configured mount points (all mounts when the list is
    /// empty). Mounts that cannot be read are logged and skipped.
    fn collect_disks(&mut self, paths: &[String]) -> Vec<DiskReading> {
        self.disks.refresh(true);

        let mut readings = Vec::new();
        for disk in self.disks.iter() {
            let mount_point = disk.mount_point().to_string_lossy().to_string();
            if !paths.is_empty() && !paths.iter().any(|p| p == &mount_point) {
                continue;
            }

            let total = disk.total_space();
            if total == 0 {
                warn!("No access to disk usage for {mount_point}");
                continue;
            }

            let used = total.saturating_sub(disk.available_space());
            readings.push(DiskReading {
                mount_point,
                usage_percent: used as f64 / total as f64 * 100.0,
            });
        }

        readings
    }

    fn collect_network(&mut self) -> NetworkReading {
        self.networks.refresh(true);

        let now = Instant::now();
        let elapsed_secs = now.duration_since(self.last_network_update).as_secs_f64();

        let (sent, recv) = network_totals(&self.networks);
        let (prev_sent, prev_recv) = self.last_network_totals;

        let reading = NetworkReading {
            sent_mbps: throughput_mbps(sent, prev_sent, elapsed_secs),
            recv_mbps: throughput_mbps(recv, prev_recv, elapsed_secs),
        };

        self.last_network_update = now;
        self.last_network_totals = (sent, recv);

        reading
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative (sent, recv) byte counters summed over all interfaces
fn network_totals(networks: &Networks) -> (u64, u64) {
    networks.values().fold((0, 0), |(sent, recv), data| {
        (
            sent + data.total_transmitted(),
            recv + data.total_received(),
        )
    })
}

/// Throughput in MB/s between two cumulative byte counters.
///
/// The elapsed window is floored at one second: rates over a near-zero
/// window are meaningless.
fn throughput_mbps(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    current.saturating_sub(previous) as f64 / elapsed_secs.max(1.0) / BYTES_PER_MB
}
