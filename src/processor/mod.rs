/*!
 * Processor Chains
 * Ordered transformation/filtering stages applied before delivery
 *
 * A builder accumulates stage factories in registration order; every build
 * instantiates fresh stages, so chains built from the same builder share no
 * state unless a factory deliberately hands out shared handles.
 */

mod builder;
mod chain;
mod sampling;

pub use builder::ProcessorChainBuilder;
pub use chain::{ChainOutcome, ProcessorChain};
pub use sampling::{Sampler, SamplingProcessor};

use crate::core::types::TelemetryItem;

/// One stage of a chain
pub trait TelemetryProcessor: Send + Sync {
    /// Return `None` to drop the item for this chain only
    fn process(&self, item: TelemetryItem) -> Option<TelemetryItem>;

    fn dispose(&self) {}
}

/// Final delivery step of a chain
pub trait ChainTerminal: Send + Sync {
    fn deliver(&self, item: TelemetryItem);
}
