/*!
 * Global Registry Tests
 * Process-wide active configuration; serialized since they share one slot
 */

use ai_os_telemetry::config::{active, ConfigurationRegistry, EnvironmentConfigurationFactory};
use ai_os_telemetry::{TelemetryConfiguration, TelemetryError};
use serial_test::serial;
use std::sync::{Arc, Barrier};
use std::thread;

fn reset_global() {
    let registry = ConfigurationRegistry::global();
    registry.teardown();
    registry.set_factory(Arc::new(EnvironmentConfigurationFactory::with_lookup(|_| None)));
}

#[test]
#[serial]
fn test_racing_active_publishes_one_instance() {
    reset_global();
    let barrier = Arc::new(Barrier::new(12));

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                TelemetryConfiguration::active().unwrap()
            })
        })
        .collect();
    let seen: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for config in &seen {
        assert!(config.same_instance(&seen[0]));
    }
    assert!(active().unwrap().same_instance(&seen[0]));
    reset_global();
}

#[test]
#[serial]
fn test_disposing_active_allows_fresh_instance() {
    reset_global();
    let first = active().unwrap();
    first.dispose();

    let second = active().unwrap();
    assert!(!second.same_instance(&first));
    assert!(!second.is_disposed());
    reset_global();
}

#[test]
#[serial]
fn test_default_factory_reads_injected_environment() {
    reset_global();
    ConfigurationRegistry::global().set_factory(Arc::new(EnvironmentConfigurationFactory::with_lookup(|name| {
        (name == "APPLICATIONINSIGHTS_CONNECTION_STRING")
            .then(|| "InstrumentationKey=FROM-ENV;IngestionEndpoint=https://env.example.com".to_string())
    })));

    let config = active().unwrap();
    assert_eq!(config.instrumentation_key(), "FROM-ENV");
    assert_eq!(config.endpoint_container().ingestion(), "https://env.example.com/");

    let fresh = TelemetryConfiguration::create_default().unwrap();
    assert!(!fresh.same_instance(&config));
    assert_eq!(fresh.instrumentation_key(), "FROM-ENV");
    reset_global();
}

#[test]
#[serial]
fn test_failed_factory_leaves_slot_empty() {
    reset_global();
    ConfigurationRegistry::global().set_factory(Arc::new(EnvironmentConfigurationFactory::with_lookup(|name| {
        (name == "APPLICATIONINSIGHTS_CONNECTION_STRING").then(|| "not-a-connection-string".to_string())
    })));

    assert!(matches!(active(), Err(TelemetryError::Initialization(_))));
    assert!(ConfigurationRegistry::global().current().is_none());
    reset_global();
}

#[test]
#[serial]
fn test_create_from_configuration_validates_text() {
    reset_global();
    assert!(TelemetryConfiguration::create_from_configuration(None).is_err());
    assert!(TelemetryConfiguration::create_from_configuration(Some("  ")).is_err());

    let config = TelemetryConfiguration::create_from_configuration(Some("<TelemetryConfiguration/>")).unwrap();
    assert!(ConfigurationRegistry::global().current().is_none());
    assert!(!config.is_disposed());
}
