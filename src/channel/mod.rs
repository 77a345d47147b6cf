/*!
 * Telemetry Channels
 * Delivery endpoints for fully processed telemetry items
 *
 * Channels that accept a new ingestion address at runtime expose it through
 * the `EndpointTarget` capability; the configuration only propagates endpoint
 * changes to channels that return one.
 */

mod memory;

pub use memory::InMemoryChannel;

use crate::core::types::TelemetryItem;
use parking_lot::RwLock;
use std::sync::Arc;

/// Capability: the endpoint address can be reassigned after construction
pub trait EndpointTarget: Send + Sync {
    fn endpoint_address(&self) -> Option<String>;
    fn set_endpoint_address(&self, address: &str);
}

/// Delivery mechanism for processed telemetry
pub trait TelemetryChannel: Send + Sync {
    fn send(&self, item: TelemetryItem);

    fn flush(&self) {}

    fn dispose(&self) {}

    /// `Some` only for channels supporting dynamic endpoint assignment
    fn endpoint_target(&self) -> Option<&dyn EndpointTarget> {
        None
    }
}

/// Shared, swappable channel reference.
///
/// A sink and the delivery stage of its chain hold the same slot, so
/// reassigning the sink's channel redirects an already built chain.
#[derive(Clone, Default)]
pub struct ChannelSlot {
    inner: Arc<RwLock<Option<Arc<dyn TelemetryChannel>>>>,
}

impl ChannelSlot {
    pub fn new(channel: Option<Arc<dyn TelemetryChannel>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(channel)),
        }
    }

    pub fn get(&self) -> Option<Arc<dyn TelemetryChannel>> {
        self.inner.read().clone()
    }

    pub fn set(&self, channel: Option<Arc<dyn TelemetryChannel>>) -> Option<Arc<dyn TelemetryChannel>> {
        std::mem::replace(&mut *self.inner.write(), channel)
    }

    /// Push `address` to the current channel if it accepts endpoint changes.
    /// Returns whether the channel was updated.
    pub fn propagate_endpoint(&self, address: &str) -> bool {
        match self.get() {
            Some(channel) => match channel.endpoint_target() {
                Some(target) => {
                    target.set_endpoint_address(address);
                    true
                }
                None => false,
            },
            None => false,
        }
    }
}

impl std::fmt::Debug for ChannelSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSlot")
            .field("present", &self.inner.read().is_some())
            .finish()
    }
}
