/*!
 * Telemetry Sinks
 * One delivery path: a channel, an independent processor chain, an enabled flag
 */

mod collection;
mod delivery;

pub use collection::TelemetrySinkCollection;
pub use delivery::{ChannelDelivery, SinkFanOut};

use crate::channel::{ChannelSlot, TelemetryChannel};
use crate::core::sync::{OnceSlot, RcuCell};
use crate::core::types::TelemetryItem;
use crate::endpoints::EndpointContainer;
use crate::processor::{ChainOutcome, ProcessorChain, ProcessorChainBuilder};
use crate::sampling::SamplingRateStore;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Independent delivery path owned by a configuration
pub struct TelemetrySink {
    name: RwLock<String>,
    channel: ChannelSlot,
    enabled: AtomicBool,
    builder: OnceSlot<ProcessorChainBuilder>,
    chain: OnceSlot<ProcessorChain>,
    rates: SamplingRateStore,
    endpoints: Arc<RcuCell<EndpointContainer>>,
    disposed: AtomicBool,
}

impl TelemetrySink {
    pub(crate) fn new(
        name: impl Into<String>,
        channel: Option<Arc<dyn TelemetryChannel>>,
        rates: SamplingRateStore,
        endpoints: Arc<RcuCell<EndpointContainer>>,
    ) -> Self {
        Self {
            name: RwLock::new(name.into()),
            channel: ChannelSlot::new(channel),
            enabled: AtomicBool::new(true),
            builder: OnceSlot::new(),
            chain: OnceSlot::new(),
            rates,
            endpoints,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    pub fn channel(&self) -> Option<Arc<dyn TelemetryChannel>> {
        self.channel.get()
    }

    /// Reassign the channel and push the current ingestion endpoint to it
    pub fn set_channel(&self, channel: Option<Arc<dyn TelemetryChannel>>) {
        self.channel.set(channel);
        let address = self.endpoints.load().formatted_ingestion_endpoint();
        if self.channel.propagate_endpoint(&address) {
            debug!(sink = %self.name(), endpoint = %address, "Channel endpoint assigned");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Builder for this sink's chain, created once
    pub fn processor_chain_builder(&self) -> Arc<ProcessorChainBuilder> {
        self.builder
            .get_or_init(|| ProcessorChainBuilder::new(self.rates.clone()))
    }

    /// This sink's chain, built on first access
    pub fn processor_chain(&self) -> Arc<ProcessorChain> {
        self.chain.get_or_init(|| self.build_chain())
    }

    /// Replace the chain with a fresh build from the builder.
    /// The replaced chain is disposed.
    pub fn rebuild_processor_chain(&self) -> Arc<ProcessorChain> {
        let fresh = Arc::new(self.build_chain());
        if let Some(previous) = self.chain.replace(Arc::clone(&fresh)) {
            previous.dispose();
        }
        info!(sink = %self.name(), stages = fresh.len(), "Sink processor chain rebuilt");
        fresh
    }

    /// Run `item` through this sink's chain into its channel
    pub fn process(&self, item: TelemetryItem) -> ChainOutcome {
        if !self.is_enabled() || self.is_disposed() {
            return ChainOutcome::Rejected;
        }
        self.processor_chain().process(item)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Dispose the chain (only if built) and the channel; idempotent
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(chain) = self.chain.get() {
            chain.dispose();
        }
        if let Some(channel) = self.channel.get() {
            channel.flush();
            channel.dispose();
        }
        debug!(sink = %self.name(), "Sink disposed");
    }

    pub(crate) fn propagate_endpoint(&self, address: &str) -> bool {
        self.channel.propagate_endpoint(address)
    }

    fn build_chain(&self) -> ProcessorChain {
        self.processor_chain_builder()
            .build(Arc::new(ChannelDelivery::new(self.channel.clone())))
    }
}

impl std::fmt::Debug for TelemetrySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySink")
            .field("name", &self.name())
            .field("channel", &self.channel)
            .field("enabled", &self.is_enabled())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_sink(name: &str, channel: Option<Arc<dyn TelemetryChannel>>) -> Arc<TelemetrySink> {
    Arc::new(TelemetrySink::new(
        name,
        channel,
        SamplingRateStore::new(),
        Arc::new(RcuCell::new(EndpointContainer::default())),
    ))
}
