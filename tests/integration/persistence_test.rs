use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use resmon::monitor::{Alert, AlertLevel, MonitorState};
use resmon::persist::{load_state, save_state, PersistedState};

fn sample_state() -> MonitorState {
    let mut state = MonitorState::new();

    let timestamp = Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, 45).unwrap();
    state.history.push_back(Alert {
        level: AlertLevel::Critical,
        resource: "CPU".into(),
        message: "CPU usage exceeded threshold".into(),
        value: 95.5,
        threshold: 80.0,
        timestamp,
    });
    state.history.push_back(Alert {
        level: AlertLevel::Warning,
        resource: "Disk /".into(),
        message: "Disk usage exceeded threshold".into(),
        value: 85.0,
        threshold: 80.0,
        timestamp,
    });

    state.last_alert_times.insert("CPU_CRITICAL".into(), timestamp.timestamp());
    state.last_alert_times.insert("Disk /_WARNING".into(), timestamp.timestamp());

    state.stats.checks_performed = 1234;
    state.stats.alerts_triggered = 56;
    state.stats.notifications_sent = 7;
    state.stats.started_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    state
}

#[test]
fn test_save_then_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor_state.json");

    let state = sample_state();
    save_state(&path, &PersistedState::from_state(&state)).unwrap();
    let loaded = load_state(&path).into_state();

    assert_eq!(loaded.stats.checks_performed, 1234);
    assert_eq!(loaded.stats.alerts_triggered, 56);
    assert_eq!(loaded.stats.notifications_sent, 7);
    assert_eq!(loaded.stats.started_at, state.stats.started_at);

    assert_eq!(loaded.history.len(), 2);
    let first = loaded.history.front().unwrap();
    assert_eq!(first.level, AlertLevel::Critical);
    assert_eq!(first.resource, "CPU");
    assert_eq!(first.value, 95.5);
    assert_eq!(first.threshold, 80.0);
    assert_eq!(
        first.timestamp.timestamp(),
        state.history.front().unwrap().timestamp.timestamp()
    );

    assert_eq!(loaded.last_alert_times, state.last_alert_times);
}

#[test]
fn test_state_file_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor_state.json");

    save_state(&path, &PersistedState::from_state(&sample_state())).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    let history = json["alert_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["level"], "CRITICAL");
    assert_eq!(history[0]["resource"], "CPU");
    // Timestamps are ISO 8601 strings
    assert!(history[0]["timestamp"]
        .as_str()
        .unwrap()
        .starts_with("2024-05-17T12:30:45"));

    assert_eq!(json["stats"]["checks_performed"], 1234);
    assert_eq!(json["last_alert_times"]["CPU_CRITICAL"].as_i64().unwrap(), 1715949045);
}

#[test]
fn test_missing_file_yields_default_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does_not_exist.json");

    let state = load_state(&path).into_state();
    assert!(state.history.is_empty());
    assert!(state.last_alert_times.is_empty());
    assert_eq!(state.stats.checks_performed, 0);
    assert!(state.enabled);
}

#[test]
fn test_corrupt_file_yields_default_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor_state.json");
    std::fs::write(&path, "{ not json at all").unwrap();

    let state = load_state(&path).into_state();
    assert!(state.history.is_empty());
    assert_eq!(state.stats.alerts_triggered, 0);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor_state.json");
    std::fs::write(&path, r#"{"last_alert_times": {"CPU_WARNING": 1700000000}}"#).unwrap();

    let state = load_state(&path).into_state();
    assert!(state.history.is_empty());
    assert_eq!(state.last_alert_times.get("CPU_WARNING"), Some(&1_700_000_000));
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("dir").join("state.json");

    save_state(&path, &PersistedState::default()).unwrap();
    assert!(path.exists());
}
