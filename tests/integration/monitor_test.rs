use chrono::{Duration, Utc};

use resmon::config::MonitoringConfig;
use resmon::monitor::{
    evaluate_alerts, AlertLevel, DiskReading, MonitorState, NetworkReading, ResourceReading,
    ALERT_HISTORY_CAPACITY,
};

fn breaching_reading() -> ResourceReading {
    ResourceReading {
        cpu_percent: Some(95.0),
        memory_percent: Some(85.0),
        disks: vec![DiskReading {
            mount_point: "/".into(),
            usage_percent: 91.0,
        }],
        network: Some(NetworkReading {
            sent_mbps: 20.0,
            recv_mbps: 0.1,
        }),
    }
}

#[test]
fn test_breaches_across_categories() {
    let config = MonitoringConfig::default();
    let alerts = evaluate_alerts(&breaching_reading(), &config);

    assert_eq!(alerts.len(), 4);
    assert_eq!(alerts[0].resource, "CPU");
    assert_eq!(alerts[0].level, AlertLevel::Critical);
    assert_eq!(alerts[1].resource, "Memory");
    assert_eq!(alerts[1].level, AlertLevel::Warning);
    assert_eq!(alerts[2].resource, "Disk /");
    assert_eq!(alerts[2].level, AlertLevel::Critical);
    assert_eq!(alerts[3].resource, "Network (outbound)");
    assert_eq!(alerts[3].level, AlertLevel::Warning);
}

#[test]
fn test_cooldown_suppresses_second_notification() {
    let config = MonitoringConfig::default();
    let cooldown = config.notification_cooldown_seconds;
    let mut state = MonitorState::new();
    let now = Utc::now();

    // Two consecutive ticks with the same breach
    let first = evaluate_alerts(&breaching_reading(), &config);
    let second = evaluate_alerts(&breaching_reading(), &config);

    assert!(state.record_and_gate(&first[0], cooldown, now));
    assert!(!state.record_and_gate(&second[0], cooldown, now + Duration::seconds(60)));

    // Once the cooldown has elapsed the breach is notifiable again
    let third = evaluate_alerts(&breaching_reading(), &config);
    assert!(state.record_and_gate(&third[0], cooldown, now + Duration::seconds(cooldown as i64)));
}

#[test]
fn test_history_never_exceeds_capacity() {
    let config = MonitoringConfig::default();
    let mut state = MonitorState::new();
    let mut now = Utc::now();

    for _ in 0..300 {
        for alert in evaluate_alerts(&breaching_reading(), &config) {
            state.record_and_gate(&alert, config.notification_cooldown_seconds, now);
        }
        now += Duration::seconds(60);
        assert!(state.history.len() <= ALERT_HISTORY_CAPACITY);
    }

    assert_eq!(state.history.len(), ALERT_HISTORY_CAPACITY);
}

#[test]
fn test_disabled_monitoring_still_counts_checks() {
    // While disabled, ticks keep counting and refreshing metrics but no
    // alerts are generated even when readings breach thresholds.
    let config = MonitoringConfig::default();
    let mut state = MonitorState::new();
    state.enabled = false;

    for _ in 0..5 {
        let reading = breaching_reading();
        let run_evaluation = state.begin_tick(&reading);
        assert!(!run_evaluation);
        if run_evaluation {
            for alert in evaluate_alerts(&reading, &config) {
                state.record_and_gate(&alert, config.notification_cooldown_seconds, Utc::now());
            }
        }
    }

    assert_eq!(state.stats.checks_performed, 5);
    assert_eq!(state.stats.alerts_triggered, 0);
    assert!(state.history.is_empty());
    // Status data stayed live
    assert_eq!(state.current.cpu_percent, 95.0);
    assert_eq!(state.current.network_sent_mbps, 20.0);
}

#[test]
fn test_reenabling_resumes_alerting() {
    let config = MonitoringConfig::default();
    let mut state = MonitorState::new();
    state.enabled = false;

    let reading = breaching_reading();
    assert!(!state.begin_tick(&reading));

    state.enabled = true;
    assert!(state.begin_tick(&reading));
    for alert in evaluate_alerts(&reading, &config) {
        state.record_and_gate(&alert, config.notification_cooldown_seconds, Utc::now());
    }

    assert_eq!(state.stats.checks_performed, 2);
    assert_eq!(state.stats.alerts_triggered, 4);
}
