//! Resource monitoring core.
//!
//! This module provides the sampling loop, threshold evaluation and the
//! shared state read by the remote command dispatcher.

pub mod alerts;
mod collector;
mod metrics;
mod runtime;
mod state;

pub use alerts::{evaluate_alerts, Alert, AlertLevel};
pub use collector::MetricsCollector;
pub use metrics::{CurrentMetrics, DiskReading, NetworkReading, ResourceReading};
pub use runtime::Monitor;
pub use state::{MonitorState, SharedState, Stats, ALERT_HISTORY_CAPACITY};
