/*!
 * Endpoint Propagation Tests
 * Connection strings flowing into sink channels and application-id providers
 */

use super::common::FixedChannel;
use ai_os_telemetry::{
    ApplicationIdProvider, DictionaryApplicationIdProvider, EndpointTarget, FallbackApplicationIdProvider,
    InMemoryChannel, ProfileApplicationIdProvider, TelemetryConfiguration, TelemetryError,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

const CUSTOM: &str = "InstrumentationKey=00000000-0000-0000-0000-000000000001;IngestionEndpoint=https://custom.example.com";

#[test]
fn test_custom_ingestion_host() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some(""), Some(channel.clone())).unwrap();

    config.set_connection_string(Some(CUSTOM)).unwrap();

    assert_eq!(config.instrumentation_key(), "00000000-0000-0000-0000-000000000001");
    assert_eq!(config.connection_string().as_deref(), Some(CUSTOM));
    assert_eq!(config.endpoint_container().ingestion(), "https://custom.example.com/");
    assert_eq!(
        channel.endpoint_address().as_deref(),
        Some("https://custom.example.com/v2/track")
    );
}

#[test]
fn test_propagation_reaches_only_capable_channels() {
    let capable_default = Arc::new(InMemoryChannel::new());
    let capable_extra = Arc::new(InMemoryChannel::new());
    let fixed = Arc::new(FixedChannel::default());

    let config = TelemetryConfiguration::with_key_and_channel(Some("K"), Some(capable_default.clone())).unwrap();
    config.add_sink("capable", Some(capable_extra.clone()));
    config.add_sink("fixed", Some(fixed.clone()));
    config.add_sink("empty", None);

    config.set_connection_string(Some(CUSTOM)).unwrap();

    for channel in [&capable_default, &capable_extra] {
        assert_eq!(
            channel.endpoint_address().as_deref(),
            Some("https://custom.example.com/v2/track")
        );
    }
    assert_eq!(config.sinks().len(), 4);
}

#[test]
fn test_endpoint_suffix_and_location() {
    let config = TelemetryConfiguration::new();
    config
        .set_connection_string(Some("InstrumentationKey=K;EndpointSuffix=example.net;Location=westus2"))
        .unwrap();

    let endpoints = config.endpoint_container();
    assert_eq!(endpoints.ingestion(), "https://westus2.dc.example.net/");
    assert_eq!(endpoints.live(), "https://westus2.live.example.net/");
    assert_eq!(endpoints.profiler(), "https://westus2.profiler.example.net/");
    assert_eq!(endpoints.snapshot(), "https://westus2.snapshot.example.net/");
}

#[test]
fn test_malformed_connection_string_changes_nothing() {
    let channel = Arc::new(InMemoryChannel::new());
    let config = TelemetryConfiguration::with_key_and_channel(Some("KEEP"), Some(channel.clone())).unwrap();
    config.set_connection_string(Some(CUSTOM)).unwrap();

    for bad in ["", "IngestionEndpoint=https://x.example.com", "InstrumentationKey", "InstrumentationKey=A;instrumentationkey=B"] {
        assert!(matches!(
            config.set_connection_string(Some(bad)),
            Err(TelemetryError::ConnectionString(_))
        ));
    }

    assert_eq!(config.connection_string().as_deref(), Some(CUSTOM));
    assert_eq!(config.endpoint_container().ingestion(), "https://custom.example.com/");
    assert_eq!(
        channel.endpoint_address().as_deref(),
        Some("https://custom.example.com/v2/track")
    );
}

#[test]
fn test_channel_assigned_after_connection_string_gets_current_endpoint() {
    let config = TelemetryConfiguration::new();
    config.set_connection_string(Some(CUSTOM)).unwrap();

    let channel = Arc::new(InMemoryChannel::new());
    config.set_telemetry_channel(Some(channel.clone()));

    assert_eq!(
        channel.endpoint_address().as_deref(),
        Some("https://custom.example.com/v2/track")
    );
}

#[test]
fn test_profile_provider_receives_application_id_endpoint() {
    let provider = Arc::new(ProfileApplicationIdProvider::new(|url| Some(format!("app-for:{}", url))));
    let config = TelemetryConfiguration::new();
    config.set_application_id_provider(Some(provider.clone()));

    config.set_connection_string(Some(CUSTOM)).unwrap();

    assert_eq!(
        provider.profile_query_endpoint().as_deref(),
        Some("https://custom.example.com/api/profiles/{0}/appId")
    );
    assert_eq!(
        provider.application_id("IKEY").as_deref(),
        Some("app-for:https://custom.example.com/api/profiles/IKEY/appId")
    );
}

#[test]
fn test_profile_provider_behind_fallback_receives_endpoint() {
    let profile = Arc::new(ProfileApplicationIdProvider::new(|_| None));
    let fallback = FallbackApplicationIdProvider::new(
        DictionaryApplicationIdProvider::new(HashMap::from([("known".to_string(), "app-1".to_string())])),
        profile.clone(),
    );
    let config = TelemetryConfiguration::new();
    config.set_application_id_provider(Some(Arc::new(fallback)));

    config.set_connection_string(Some(CUSTOM)).unwrap();

    assert_eq!(
        profile.endpoint_address().as_deref(),
        Some("https://custom.example.com/api/profiles/{0}/appId")
    );
    let provider = config.application_id_provider().unwrap();
    assert_eq!(provider.application_id("known").as_deref(), Some("app-1"));
}

#[test]
fn test_dictionary_provider_is_left_alone() {
    let config = TelemetryConfiguration::new();
    config.set_application_id_provider(Some(Arc::new(DictionaryApplicationIdProvider::default())));

    config.set_connection_string(Some(CUSTOM)).unwrap();
    assert_eq!(config.instrumentation_key(), "00000000-0000-0000-0000-000000000001");
}
