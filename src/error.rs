use std::io;
use thiserror::Error;

/// Custom error type for the resmon application
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State persistence error: {0}")]
    State(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Monitor error: {0}")]
    Monitor(String),
}

/// Result type alias for the resmon application
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonitorError::Config(msg.into())
    }

    /// Create a state persistence error
    pub fn state<S: Into<String>>(msg: S) -> Self {
        MonitorError::State(msg.into())
    }

    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        MonitorError::MetricCollection(msg.into())
    }

    pub fn telegram<S: Into<String>>(msg: S) -> Self {
        MonitorError::Telegram(msg.into())
    }

    pub fn monitor<S: Into<String>>(msg: S) -> Self {
        MonitorError::Monitor(msg.into())
    }
}
