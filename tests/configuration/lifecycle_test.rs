/*!
 * Configuration Lifecycle Tests
 * Construction, property validation, sink management and disposal
 */

use ai_os_telemetry::{
    ChainOutcome, InMemoryChannel, TelemetryConfiguration, TelemetryError, TelemetryItem,
    TelemetryProcessor,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_key_without_channel() {
    let config = TelemetryConfiguration::with_instrumentation_key("ABC");

    assert_eq!(config.instrumentation_key(), "ABC");
    assert!(config.telemetry_channel().is_none());
    assert_eq!(config.sinks().len(), 1);
    assert!(config.sinks().is_default(&config.default_sink()));
    assert_eq!(
        config.endpoint_container().ingestion(),
        "https://dc.services.visualstudio.com/"
    );
}

#[test]
fn test_construction_assigns_default_endpoint_to_channel() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("ABC"), Some(channel.clone())).unwrap();

    assert!(config.telemetry_channel().is_some());
    assert_eq!(
        ai_os_telemetry::EndpointTarget::endpoint_address(channel.as_ref()).as_deref(),
        Some("https://dc.services.visualstudio.com/v2/track")
    );
}

#[test]
fn test_absent_key_is_rejected() {
    let result = TelemetryConfiguration::with_key_and_channel(None, None);
    assert!(matches!(
        result,
        Err(TelemetryError::InvalidArgument {
            name: "instrumentation_key",
            ..
        })
    ));

    let config = TelemetryConfiguration::with_instrumentation_key("KEEP");
    assert!(config.set_instrumentation_key(None).is_err());
    assert_eq!(config.instrumentation_key(), "KEEP");

    // keys are not format-validated
    config.set_instrumentation_key(Some("not a guid")).unwrap();
    assert_eq!(config.instrumentation_key(), "not a guid");
}

#[test]
fn test_absent_connection_string_leaves_key() {
    let config = TelemetryConfiguration::with_instrumentation_key("KEEP");

    assert!(matches!(
        config.set_connection_string(None),
        Err(TelemetryError::InvalidArgument { .. })
    ));
    assert_eq!(config.instrumentation_key(), "KEEP");
    assert!(config.connection_string().is_none());
}

#[test]
fn test_default_sink_cannot_be_removed() {
    let config = TelemetryConfiguration::new();
    let default_sink = config.default_sink();
    let secondary = config.add_sink("secondary", None);

    assert!(!config.remove_sink(&default_sink));
    assert_eq!(config.sinks().len(), 2);

    assert!(config.remove_sink(&secondary));
    assert!(!config.remove_sink(&secondary));
    assert_eq!(config.sinks().len(), 1);
    assert!(config.sinks().contains(&default_sink));
}

#[test]
fn test_double_dispose_flushes_once() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("K"), Some(channel.clone())).unwrap();

    config.dispose();
    config.dispose();

    assert!(config.is_disposed());
    assert_eq!(channel.flush_count(), 1);
    assert!(channel.is_disposed());
}

#[test]
fn test_concurrent_dispose_tears_down_once() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("K"), Some(channel.clone())).unwrap();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                config.dispose();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(channel.flush_count(), 1);
}

#[test]
fn test_dispose_keeps_only_default_sink() {
    let primary = Arc::new(InMemoryChannel::new());
    let secondary = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("K"), Some(primary.clone())).unwrap();
    let extra = config.add_sink("secondary", Some(secondary.clone()));

    config.dispose();

    assert_eq!(config.sinks().len(), 1);
    assert!(config.default_sink().is_disposed());
    assert!(extra.is_disposed());
    assert!(primary.is_disposed());
    assert!(secondary.is_disposed());
}

#[test]
fn test_disposed_configuration_rejects_items() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("K"), Some(channel.clone())).unwrap();
    config.dispose();

    assert_eq!(config.track(TelemetryItem::event("late")), ChainOutcome::Rejected);
    assert!(channel.is_empty());
}

#[test]
fn test_disabled_telemetry_rejects_items() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("K"), Some(channel.clone())).unwrap();

    config.set_disable_telemetry(true);
    assert_eq!(config.track(TelemetryItem::event("muted")), ChainOutcome::Rejected);

    config.set_disable_telemetry(false);
    assert_eq!(config.track(TelemetryItem::event("heard")), ChainOutcome::Delivered);
    assert_eq!(channel.len(), 1);
}

#[test]
fn test_track_stamps_key_and_runs_initializers_in_order() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("STAMP"), Some(channel.clone())).unwrap();
    config.add_telemetry_initializer(Arc::new(|item: &mut TelemetryItem| {
        item.properties.insert("order".to_string(), "first".to_string());
    }));
    config.add_telemetry_initializer(Arc::new(|item: &mut TelemetryItem| {
        let previous = item.properties.get("order").cloned().unwrap_or_default();
        item.properties.insert("order".to_string(), format!("{}-second", previous));
    }));

    config.track(TelemetryItem::event("a"));
    config.track(TelemetryItem::event("b").with_instrumentation_key("EXPLICIT"));

    let items = channel.drain();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].instrumentation_key, "STAMP");
    assert_eq!(items[0].properties["order"], "first-second");
    assert_eq!(items[1].instrumentation_key, "EXPLICIT");
    assert_eq!(config.telemetry_initializers().len(), 2);
}

#[test]
fn test_experimental_features_are_case_insensitive() {
    let config = TelemetryConfiguration::new();
    config.enable_experimental_feature("LiveMetrics");
    config.enable_experimental_feature("livemetrics");

    assert!(config.is_experimental_feature_enabled("LIVEMETRICS"));
    assert!(!config.is_experimental_feature_enabled("other"));
    assert_eq!(config.experimental_features(), vec!["LiveMetrics".to_string()]);
}

struct Counted(Arc<AtomicUsize>);

impl TelemetryProcessor for Counted {
    fn process(&self, item: TelemetryItem) -> Option<TelemetryItem> {
        Some(item)
    }

    fn dispose(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_concurrent_first_chain_access_builds_one_chain() {
    let config = TelemetryConfiguration::new();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (config.processor_chain_builder(), config.processor_chain())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for (builder, chain) in &results {
        assert!(Arc::ptr_eq(builder, &results[0].0));
        assert!(Arc::ptr_eq(chain, &results[0].1));
    }
}

#[test]
fn test_rebuild_disposes_replaced_chain() {
    let disposals = Arc::new(AtomicUsize::new(0));
    let config = TelemetryConfiguration::new();
    let counter = Arc::clone(&disposals);
    config
        .processor_chain_builder()
        .use_processor(move || Counted(Arc::clone(&counter)));

    let first = config.processor_chain();
    let second = config.rebuild_processor_chain();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(first.is_disposed());
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&config.processor_chain(), &second));

    config.dispose();
    assert_eq!(disposals.load(Ordering::SeqCst), 2);
}
