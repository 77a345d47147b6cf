/*!
 * Telemetry Initializers
 */

use crate::core::types::TelemetryItem;

/// Enriches items before they enter the processor chain.
/// Initializers run in registration order, shared across all sinks.
pub trait TelemetryInitializer: Send + Sync {
    fn initialize(&self, item: &mut TelemetryItem);
}

impl<F> TelemetryInitializer for F
where
    F: Fn(&mut TelemetryItem) + Send + Sync,
{
    fn initialize(&self, item: &mut TelemetryItem) {
        self(item)
    }
}
