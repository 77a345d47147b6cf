/*!
 * Sampling Stage
 * Extension point for sampling algorithms; the algorithm itself is pluggable
 */

use super::TelemetryProcessor;
use crate::core::types::TelemetryItem;
use crate::sampling::SamplingRateStore;
use std::sync::Arc;
use tracing::trace;

/// Sampling algorithm plugged into a `SamplingProcessor`
pub trait Sampler: Send + Sync {
    /// Percentage (0-100] to apply to this item
    fn sampling_percentage(&self, item: &TelemetryItem) -> f64;

    /// Whether the item is kept at `percentage`
    fn is_sampled_in(&self, item: &TelemetryItem, percentage: f64) -> bool;
}

/// Applies a `Sampler` and records the last rate per telemetry kind
pub struct SamplingProcessor {
    sampler: Arc<dyn Sampler>,
    rates: SamplingRateStore,
}

impl SamplingProcessor {
    pub fn new(sampler: Arc<dyn Sampler>, rates: SamplingRateStore) -> Self {
        Self { sampler, rates }
    }
}

impl TelemetryProcessor for SamplingProcessor {
    fn process(&self, mut item: TelemetryItem) -> Option<TelemetryItem> {
        // sampled upstream
        if item.sample_rate.is_some() {
            return Some(item);
        }

        let percentage = self.sampler.sampling_percentage(&item);
        self.rates.set(item.kind, percentage);

        if percentage >= 100.0 {
            return Some(item);
        }

        if self.sampler.is_sampled_in(&item, percentage) {
            item.sample_rate = Some(percentage);
            Some(item)
        } else {
            trace!(kind = item.kind.as_str(), percentage, "Item sampled out");
            None
        }
    }
}
