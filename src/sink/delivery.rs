/*!
 * Chain Terminals
 * Delivery into a channel, or fan-out across sinks
 */

use super::TelemetrySinkCollection;
use crate::channel::ChannelSlot;
use crate::core::types::TelemetryItem;
use crate::processor::ChainTerminal;
use tracing::trace;

/// Terminal of a sink chain: hands the item to the sink's current channel
pub struct ChannelDelivery {
    channel: ChannelSlot,
}

impl ChannelDelivery {
    pub fn new(channel: ChannelSlot) -> Self {
        Self { channel }
    }
}

impl ChainTerminal for ChannelDelivery {
    fn deliver(&self, item: TelemetryItem) {
        match self.channel.get() {
            Some(channel) => channel.send(item),
            None => trace!(item = %item.id, "No channel assigned; item discarded"),
        }
    }
}

/// Terminal of the common chain: each enabled sink gets its own copy, in order
pub struct SinkFanOut {
    sinks: TelemetrySinkCollection,
}

impl SinkFanOut {
    pub fn new(sinks: TelemetrySinkCollection) -> Self {
        Self { sinks }
    }
}

impl ChainTerminal for SinkFanOut {
    fn deliver(&self, item: TelemetryItem) {
        let mut targets: Vec<_> = self
            .sinks
            .snapshot()
            .into_iter()
            .filter(|sink| sink.is_enabled() && !sink.is_disposed())
            .collect();

        let Some(last) = targets.pop() else {
            trace!(item = %item.id, "No enabled sinks; item discarded");
            return;
        };

        for sink in &targets {
            sink.process(item.clone());
        }
        last.process(item);
    }
}
