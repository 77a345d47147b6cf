/*!
 * Telemetry Configuration
 * Aggregate root: keys, endpoints, sinks, processor chains and metrics
 *
 * Lifecycle: Created -> (optionally) Active -> Disposed. Disposal is
 * first-caller-wins and runs an ordered teardown exactly once:
 * 1. clear registry slots still holding this instance
 * 2. flush and stop the metric manager
 * 3. dispose the common processor chain (only if built)
 * 4. dispose every sink, removing all but the default
 */

mod factory;
mod initializer;
mod registry;

pub use factory::{
    ConfigurationFactory, EnvironmentConfigurationFactory, TelemetryModule, TelemetryModules,
};
pub use initializer::TelemetryInitializer;
pub use registry::{active, ConfigurationRegistry};

use crate::appid::{propagate_profile_endpoint, ApplicationIdProvider};
use crate::channel::TelemetryChannel;
use crate::core::errors::{ConnectionStringError, TelemetryError, TelemetryResult};
use crate::core::limits::DEFAULT_SINK_NAME;
use crate::core::sync::{Contended, OnceSlot, RcuCell};
use crate::core::types::TelemetryItem;
use crate::diagnostics::span_operation;
use crate::endpoints::{EndpointContainer, EndpointProvider};
use crate::metrics::{MetricAggregate, MetricConsumer, MetricManager, MetricManagerOptions};
use crate::processor::{ChainOutcome, ProcessorChain, ProcessorChainBuilder};
use crate::sampling::SamplingRateStore;
use crate::sink::{SinkFanOut, TelemetrySink, TelemetrySinkCollection};
use parking_lot::{Mutex, RwLock};
use registry::RegistryState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

pub(crate) struct ConfigurationInner {
    instrumentation_key: RwLock<String>,
    connection_string: RwLock<Option<String>>,
    disable_telemetry: AtomicBool,
    experimental_features: RwLock<Vec<String>>,
    endpoints: Arc<RcuCell<EndpointContainer>>,
    application_id_provider: RwLock<Option<Arc<dyn ApplicationIdProvider>>>,
    initializers: RwLock<Vec<Arc<dyn TelemetryInitializer>>>,
    sinks: TelemetrySinkCollection,
    default_sink: Arc<TelemetrySink>,
    rates: SamplingRateStore,
    chain_builder: OnceSlot<ProcessorChainBuilder>,
    chain: OnceSlot<ProcessorChain>,
    metric_manager: OnceSlot<MetricManager>,
    metric_options: RwLock<MetricManagerOptions>,
    // serializes endpoint propagation between concurrent updates
    update_lock: Mutex<()>,
    owners: Mutex<Vec<Weak<RegistryState>>>,
    disposed: AtomicBool,
    // open only while dispose runs its own metric flush
    draining_metrics: AtomicBool,
}

/// Shared handle to one telemetry configuration; clones refer to the same instance
#[derive(Clone)]
pub struct TelemetryConfiguration {
    inner: Arc<ConfigurationInner>,
}

impl TelemetryConfiguration {
    /// Empty instrumentation key, no channel
    pub fn new() -> Self {
        Self::build(String::new(), None)
    }

    pub fn with_instrumentation_key(key: &str) -> Self {
        Self::build(key.to_string(), None)
    }

    /// Fails with an argument error when `key` is absent
    pub fn with_key_and_channel(
        key: Option<&str>,
        channel: Option<Arc<dyn TelemetryChannel>>,
    ) -> TelemetryResult<Self> {
        let key = key.ok_or_else(|| log_error(TelemetryError::null_argument("instrumentation_key")))?;
        Ok(Self::build(key.to_string(), channel))
    }

    fn build(key: String, channel: Option<Arc<dyn TelemetryChannel>>) -> Self {
        let endpoints = Arc::new(RcuCell::new(EndpointContainer::default()));
        let rates = SamplingRateStore::new();
        let default_sink = Arc::new(TelemetrySink::new(
            DEFAULT_SINK_NAME,
            None,
            rates.clone(),
            Arc::clone(&endpoints),
        ));
        // assigning through the sink pushes the default endpoint to the channel
        default_sink.set_channel(channel);

        let sinks = TelemetrySinkCollection::new();
        sinks.add(Arc::clone(&default_sink));

        Self {
            inner: Arc::new(ConfigurationInner {
                instrumentation_key: RwLock::new(key),
                connection_string: RwLock::new(None),
                disable_telemetry: AtomicBool::new(false),
                experimental_features: RwLock::new(Vec::new()),
                endpoints,
                application_id_provider: RwLock::new(None),
                initializers: RwLock::new(Vec::new()),
                sinks,
                default_sink,
                rates,
                chain_builder: OnceSlot::new(),
                chain: OnceSlot::new(),
                metric_manager: OnceSlot::new(),
                metric_options: RwLock::new(MetricManagerOptions::default()),
                update_lock: Mutex::new(()),
                owners: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
                draining_metrics: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ConfigurationInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn register_owner(&self, owner: Weak<RegistryState>) {
        self.inner.owners.lock().push(owner);
    }

    /// Active configuration of the process-wide registry
    pub fn active() -> TelemetryResult<Self> {
        ConfigurationRegistry::global().active()
    }

    /// Fresh instance initialized by the process-wide registry's factory
    pub fn create_default() -> TelemetryResult<Self> {
        ConfigurationRegistry::global().create_default()
    }

    /// Fresh instance initialized from serialized configuration text
    pub fn create_from_configuration(text: Option<&str>) -> TelemetryResult<Self> {
        ConfigurationRegistry::global().create_from_configuration(text)
    }

    /// Whether both handles refer to the same instance
    pub fn same_instance(&self, other: &TelemetryConfiguration) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Keys and endpoints
    // =========================================================================

    pub fn instrumentation_key(&self) -> String {
        self.inner.instrumentation_key.read().clone()
    }

    /// No format validation; only absence is rejected
    pub fn set_instrumentation_key(&self, key: Option<&str>) -> TelemetryResult<()> {
        let key = key.ok_or_else(|| log_error(TelemetryError::null_argument("instrumentation_key")))?;
        *self.inner.instrumentation_key.write() = key.to_string();
        Ok(())
    }

    pub fn connection_string(&self) -> Option<String> {
        self.inner.connection_string.read().clone()
    }

    /// Apply a connection string.
    ///
    /// The string is fully validated and the new endpoint container built
    /// before any state changes, so a rejected string leaves the key,
    /// endpoints and channels untouched. On success the ingestion endpoint
    /// goes to every sink channel that accepts endpoint changes and the
    /// application-id endpoint goes to the application-id provider.
    pub fn set_connection_string(&self, value: Option<&str>) -> TelemetryResult<()> {
        let _span = span_operation("set_connection_string").entered();
        let value = value.ok_or_else(|| log_error(TelemetryError::null_argument("connection_string")))?;

        let (key, container) = resolve_connection_string(value).map_err(|e| {
            error!(error = %e, "Failed to apply connection string");
            TelemetryError::from(e)
        })?;

        let _guard = self.inner.update_lock.lock();
        *self.inner.connection_string.write() = Some(value.to_string());
        *self.inner.instrumentation_key.write() = key;
        self.inner.endpoints.store(container);

        let endpoints = self.inner.endpoints.load();
        let ingestion = endpoints.formatted_ingestion_endpoint();
        let updated = self
            .inner
            .sinks
            .snapshot()
            .iter()
            .filter(|sink| sink.propagate_endpoint(&ingestion))
            .count();

        let application_id_updated = self
            .application_id_provider()
            .map(|provider| {
                propagate_profile_endpoint(
                    provider.as_ref(),
                    &endpoints.formatted_application_id_endpoint(),
                )
            })
            .unwrap_or(false);

        info!(
            ingestion = %ingestion,
            channels_updated = updated,
            application_id_updated,
            "Connection string applied"
        );
        Ok(())
    }

    /// Current resolved endpoints
    pub fn endpoint_container(&self) -> Arc<EndpointContainer> {
        self.inner.endpoints.load()
    }

    // =========================================================================
    // Channels and sinks
    // =========================================================================

    /// Channel of the default sink
    pub fn telemetry_channel(&self) -> Option<Arc<dyn TelemetryChannel>> {
        self.inner.default_sink.channel()
    }

    /// Reassign the default sink's channel; ignored once disposed
    pub fn set_telemetry_channel(&self, channel: Option<Arc<dyn TelemetryChannel>>) {
        if self.is_disposed() {
            debug!("Ignoring channel assignment on disposed configuration");
            return;
        }
        let _guard = self.inner.update_lock.lock();
        self.inner.default_sink.set_channel(channel);
    }

    pub fn default_sink(&self) -> Arc<TelemetrySink> {
        Arc::clone(&self.inner.default_sink)
    }

    pub fn sinks(&self) -> TelemetrySinkCollection {
        self.inner.sinks.clone()
    }

    /// Create a sink sharing this configuration's endpoints and sampling rates
    pub fn add_sink(
        &self,
        name: impl Into<String>,
        channel: Option<Arc<dyn TelemetryChannel>>,
    ) -> Arc<TelemetrySink> {
        let sink = Arc::new(TelemetrySink::new(
            name,
            channel,
            self.inner.rates.clone(),
            Arc::clone(&self.inner.endpoints),
        ));
        self.inner.sinks.add(Arc::clone(&sink));
        debug!(sink = %sink.name(), total = self.inner.sinks.len(), "Sink added");
        sink
    }

    /// Remove a non-default sink; the default sink is never removed
    pub fn remove_sink(&self, sink: &Arc<TelemetrySink>) -> bool {
        self.inner.sinks.remove(sink)
    }

    pub fn sampling_rates(&self) -> SamplingRateStore {
        self.inner.rates.clone()
    }

    // =========================================================================
    // Application id, initializers, flags
    // =========================================================================

    pub fn application_id_provider(&self) -> Option<Arc<dyn ApplicationIdProvider>> {
        self.inner.application_id_provider.read().clone()
    }

    pub fn set_application_id_provider(&self, provider: Option<Arc<dyn ApplicationIdProvider>>) {
        *self.inner.application_id_provider.write() = provider;
    }

    pub fn add_telemetry_initializer(&self, initializer: Arc<dyn TelemetryInitializer>) {
        self.inner.initializers.write().push(initializer);
    }

    pub fn telemetry_initializers(&self) -> Vec<Arc<dyn TelemetryInitializer>> {
        self.inner.initializers.read().clone()
    }

    pub fn disable_telemetry(&self) -> bool {
        self.inner.disable_telemetry.load(Ordering::Acquire)
    }

    pub fn set_disable_telemetry(&self, disabled: bool) {
        self.inner.disable_telemetry.store(disabled, Ordering::Release);
    }

    pub fn enable_experimental_feature(&self, feature: impl Into<String>) {
        let feature = feature.into();
        let mut features = self.inner.experimental_features.write();
        if !features.iter().any(|f| f.eq_ignore_ascii_case(&feature)) {
            features.push(feature);
        }
    }

    pub fn is_experimental_feature_enabled(&self, feature: &str) -> bool {
        self.inner
            .experimental_features
            .read()
            .iter()
            .any(|f| f.eq_ignore_ascii_case(feature))
    }

    pub fn experimental_features(&self) -> Vec<String> {
        self.inner.experimental_features.read().clone()
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Builder of the common chain, created once
    pub fn processor_chain_builder(&self) -> Arc<ProcessorChainBuilder> {
        self.inner
            .chain_builder
            .get_or_init(|| ProcessorChainBuilder::new(self.inner.rates.clone()))
    }

    /// Common chain ahead of the per-sink fan-out, built on first access
    pub fn processor_chain(&self) -> Arc<ProcessorChain> {
        self.inner.chain.get_or_init(|| self.build_chain())
    }

    /// Replace the common chain with a fresh build; the old one is disposed
    pub fn rebuild_processor_chain(&self) -> Arc<ProcessorChain> {
        let fresh = Arc::new(self.build_chain());
        if let Some(previous) = self.inner.chain.replace(Arc::clone(&fresh)) {
            previous.dispose();
        }
        info!(stages = fresh.len(), "Processor chain rebuilt");
        fresh
    }

    fn build_chain(&self) -> ProcessorChain {
        self.processor_chain_builder()
            .build(Arc::new(SinkFanOut::new(self.inner.sinks.clone())))
    }

    /// Producer entry point: stamp the key, run initializers, process
    pub fn track(&self, item: TelemetryItem) -> ChainOutcome {
        if self.is_disposed() {
            return ChainOutcome::Rejected;
        }
        self.submit(item)
    }

    fn submit(&self, mut item: TelemetryItem) -> ChainOutcome {
        if self.disable_telemetry() {
            return ChainOutcome::Rejected;
        }

        if item.instrumentation_key.is_empty() {
            item.instrumentation_key = self.instrumentation_key();
        }
        for initializer in self.telemetry_initializers() {
            initializer.initialize(&mut item);
        }

        self.processor_chain().process(item)
    }

    /// Flush pending metrics and every sink channel
    pub fn flush(&self) {
        if let Some(manager) = self.inner.metric_manager.get() {
            manager.flush();
        }
        for sink in self.inner.sinks.snapshot() {
            if let Some(channel) = sink.channel() {
                channel.flush();
            }
        }
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    /// Options used when the metric manager is created
    pub fn set_metric_manager_options(&self, options: MetricManagerOptions) {
        *self.inner.metric_options.write() = options;
    }

    /// The metric manager, optionally created on first request.
    ///
    /// Racing creators each build a candidate; one compare-and-swap decides
    /// the winner and the loser's aggregation cycle is stopped without
    /// waiting for it. A disposed configuration never creates one.
    pub fn get_metric_manager(&self, create_if_not_exists: bool) -> Option<Arc<MetricManager>> {
        if let Some(existing) = self.inner.metric_manager.get() {
            return Some(existing);
        }
        if !create_if_not_exists || self.is_disposed() {
            return None;
        }

        let consumer = Arc::new(ConfigurationMetricConsumer {
            config: Arc::downgrade(&self.inner),
        });
        let options = self.inner.metric_options.read().clone();
        let candidate = Arc::new(MetricManager::new(consumer, options));
        Some(self.install_metric_manager(candidate))
    }

    fn install_metric_manager(&self, candidate: Arc<MetricManager>) -> Arc<MetricManager> {
        match self.inner.metric_manager.try_install(candidate) {
            Ok(installed) => {
                // dispose may have read the empty slot before this install
                if self.is_disposed() {
                    installed.flush();
                    installed.shutdown();
                    debug!("Metric manager installed during dispose; stopped");
                } else {
                    debug!("Metric manager created");
                }
                installed
            }
            Err(Contended { winner, loser }) => {
                loser.stop_cycle_async();
                debug!("Discarded losing metric manager candidate");
                winner
            }
        }
    }

    // =========================================================================
    // Disposal
    // =========================================================================

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Ordered teardown, executed once by the first caller
    pub fn dispose(&self) {
        if self
            .inner
            .disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Configuration already disposed");
            return;
        }
        let _span = span_operation("dispose").entered();

        let owners: Vec<Weak<RegistryState>> = std::mem::take(&mut *self.inner.owners.lock());
        for owner in owners.iter().filter_map(Weak::upgrade) {
            if owner.slot.compare_and_clear(&self.inner) {
                info!("Active configuration cleared");
            }
        }

        if let Some(manager) = self.inner.metric_manager.get() {
            self.inner.draining_metrics.store(true, Ordering::Release);
            manager.flush();
            self.inner.draining_metrics.store(false, Ordering::Release);
            manager.shutdown();
        }

        if let Some(chain) = self.inner.chain.get() {
            chain.dispose();
        }

        for sink in self.inner.sinks.snapshot() {
            sink.dispose();
            if !self.inner.sinks.is_default(&sink) {
                self.inner.sinks.remove(&sink);
            }
        }

        info!("Telemetry configuration disposed");
    }
}

impl Default for TelemetryConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TelemetryConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryConfiguration")
            .field("instrumentation_key", &self.instrumentation_key())
            .field("endpoints", &self.endpoint_container())
            .field("sinks", &self.inner.sinks)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Feeds aggregated metrics back into the owning configuration's pipeline
struct ConfigurationMetricConsumer {
    config: Weak<ConfigurationInner>,
}

impl MetricConsumer for ConfigurationMetricConsumer {
    fn consume(&self, aggregates: Vec<MetricAggregate>) {
        let Some(inner) = self.config.upgrade() else {
            debug!(series = aggregates.len(), "Configuration gone; aggregates dropped");
            return;
        };
        if inner.disposed.load(Ordering::Acquire) && !inner.draining_metrics.load(Ordering::Acquire) {
            debug!(series = aggregates.len(), "Configuration disposed; aggregates dropped");
            return;
        }
        let config = TelemetryConfiguration::from_inner(inner);

        for aggregate in aggregates {
            let item = TelemetryItem::metric(aggregate.name, aggregate.sum)
                .with_property("count", aggregate.count.to_string())
                .with_property("min", aggregate.min.to_string())
                .with_property("max", aggregate.max.to_string());
            config.submit(item);
        }
    }
}

fn resolve_connection_string(value: &str) -> Result<(String, EndpointContainer), ConnectionStringError> {
    let provider = EndpointProvider::parse(value)?;
    let key = provider.instrumentation_key()?.to_string();
    let container = EndpointContainer::from_provider(&provider)?;
    Ok((key, container))
}

fn log_error(err: TelemetryError) -> TelemetryError {
    error!(error = %err, "Telemetry configuration rejected argument");
    err
}
