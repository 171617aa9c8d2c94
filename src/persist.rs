//! Durable monitor state.
//!
//! History, counters and cooldown timestamps survive restarts through a
//! single JSON file. A missing file yields default state; a corrupt one
//! yields default state plus a logged warning — neither stops startup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};
use crate::monitor::{Alert, MonitorState, Stats, ALERT_HISTORY_CAPACITY};

/// On-disk monitor state. Field names are the wire format; renaming them
/// breaks older state files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub alert_history: Vec<Alert>,
    #[serde(default)]
    pub stats: Stats,
    /// "{resource}_{LEVEL}" -> epoch seconds of the last notification
    #[serde(default)]
    pub last_alert_times: HashMap<String, i64>,
}

impl PersistedState {
    /// Snapshot the in-memory state for serialization
    pub fn from_state(state: &MonitorState) -> Self {
        Self {
            alert_history: state.history.iter().cloned().collect(),
            stats: state.stats.clone(),
            last_alert_times: state.last_alert_times.clone(),
        }
    }

    /// Rebuild in-memory state from a loaded snapshot
    pub fn into_state(self) -> MonitorState {
        let mut state = MonitorState::new();
        state.history = self.alert_history.into_iter().collect();
        while state.history.len() > ALERT_HISTORY_CAPACITY {
            state.history.pop_front();
        }
        state.stats = self.stats;
        state.last_alert_times = self.last_alert_times;
        state
    }
}

/// Serialize state to `path`, creating parent directories as needed
pub fn save_state(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let data = serde_json::to_string_pretty(state)
        .map_err(|e| MonitorError::state(format!("Failed to serialize state: {e}")))?;
    fs::write(path, data)?;
    info!("State saved to {}", path.display());

    Ok(())
}

/// Load state from `path`, falling back to defaults when the file is
/// missing or unreadable
pub fn load_state(path: &Path) -> PersistedState {
    if !path.exists() {
        return PersistedState::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(state) => {
                info!("State loaded from {}", path.display());
                state
            }
            Err(e) => {
                warn!(
                    "State file {} is corrupt, starting fresh: {e}",
                    path.display()
                );
                PersistedState::default()
            }
        },
        Err(e) => {
            warn!("Cannot read state file {}: {e}", path.display());
            PersistedState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::AlertLevel;
    use chrono::Utc;

    #[test]
    fn test_oversized_history_is_truncated_on_load() {
        let alerts: Vec<Alert> = (0..120)
            .map(|i| Alert {
                level: AlertLevel::Warning,
                resource: "CPU".into(),
                message: "CPU usage exceeded threshold".into(),
                value: i as f64,
                threshold: 80.0,
                timestamp: Utc::now(),
            })
            .collect();

        let state = PersistedState {
            alert_history: alerts,
            ..Default::default()
        }
        .into_state();

        assert_eq!(state.history.len(), ALERT_HISTORY_CAPACITY);
        // The oldest entries are the ones dropped
        assert_eq!(state.history.front().unwrap().value, 20.0);
    }

    #[test]
    fn test_snapshot_preserves_cooldowns() {
        let mut state = MonitorState::new();
        state.last_alert_times.insert("CPU_WARNING".into(), 1_700_000_000);

        let snapshot = PersistedState::from_state(&state);
        let restored = snapshot.into_state();
        assert_eq!(
            restored.last_alert_times.get("CPU_WARNING"),
            Some(&1_700_000_000)
        );
    }
}
