// Resmon Library - Public API

// Re-export error types
pub mod error;
pub use error::{MonitorError, Result};

// Module declarations
pub mod config;
pub mod monitor;
pub mod persist;
pub mod telegram;

// Re-export commonly used types
pub use config::Config;
pub use monitor::Monitor;

// Initialize logging (RUST_LOG overrides the configured level)
pub fn init_logging(level: log::LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }
    let _ = builder.try_init();
}
