/*!
 * AI-OS Telemetry Library
 * Telemetry configuration, sink fan-out and processor-chain composition
 */

pub mod appid;
pub mod channel;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod endpoints;
pub mod metrics;
pub mod processor;
pub mod sampling;
pub mod sink;

// Re-exports
pub use appid::{
    ApplicationIdProvider, DictionaryApplicationIdProvider, FallbackApplicationIdProvider,
    ProfileApplicationIdProvider,
};
pub use channel::{EndpointTarget, InMemoryChannel, TelemetryChannel};
pub use config::{
    ConfigurationFactory, ConfigurationRegistry, EnvironmentConfigurationFactory, TelemetryConfiguration,
    TelemetryInitializer, TelemetryModule, TelemetryModules,
};
pub use crate::core::errors::{ConnectionStringError, TelemetryError, TelemetryResult};
pub use crate::core::types::{TelemetryItem, TelemetryKind};
pub use endpoints::{ConnectionString, EndpointContainer, EndpointName, EndpointProvider};
pub use metrics::{MetricAggregate, MetricConsumer, MetricManager, MetricManagerOptions};
pub use processor::{ChainOutcome, ProcessorChain, ProcessorChainBuilder, TelemetryProcessor};
pub use sampling::SamplingRateStore;
pub use sink::{TelemetrySink, TelemetrySinkCollection};
