/*!
 * Metric Manager Tests
 * Lazy creation, single-winner install and teardown through the configuration
 */

use ai_os_telemetry::{InMemoryChannel, MetricManagerOptions, TelemetryConfiguration, TelemetryKind};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_absent_manager_is_not_created_on_request_without_create() {
    let config = TelemetryConfiguration::new();
    assert!(config.get_metric_manager(false).is_none());
}

#[test]
fn test_sequential_requests_return_same_manager() {
    let config = TelemetryConfiguration::new();
    let first = config.get_metric_manager(true).unwrap();
    let second = config.get_metric_manager(true).unwrap();
    let third = config.get_metric_manager(false).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
    config.dispose();
}

#[test]
fn test_racing_requests_return_same_manager() {
    for _ in 0..20 {
        let config = TelemetryConfiguration::new();
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let config = config.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    config.get_metric_manager(true).unwrap()
                })
            })
            .collect();
        let managers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for manager in &managers {
            assert!(Arc::ptr_eq(manager, &managers[0]));
        }
        assert!(managers[0].is_cycle_running());
        config.dispose();
    }
}

#[test]
fn test_aggregation_cycle_delivers_metric_items() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("K"), Some(channel.clone())).unwrap();
    config.set_metric_manager_options(MetricManagerOptions {
        aggregation_interval_ms: 10,
    });

    let manager = config.get_metric_manager(true).unwrap();
    manager.track_value("cpu", 0.5);

    let deadline = Instant::now() + Duration::from_secs(5);
    while channel.is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    let items = channel.drain();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, TelemetryKind::Metric);
    assert_eq!(items[0].name, "cpu");
    config.dispose();
    assert!(!manager.is_cycle_running());
}

#[test]
fn test_disposed_configuration_refuses_new_manager() {
    let config = TelemetryConfiguration::new();
    config.dispose();

    assert!(config.get_metric_manager(true).is_none());
}

#[test]
fn test_dispose_stops_aggregation_cycle() {
    let config = TelemetryConfiguration::new();
    let manager = config.get_metric_manager(true).unwrap();

    config.dispose();

    assert!(!manager.is_cycle_running());
    assert_eq!(manager.pending_series(), 0);
}
