/*!
 * Sampling Rate Store
 * Last-known sampling percentage per telemetry kind, shared across sinks
 */

use crate::core::types::TelemetryKind;
use ahash::RandomState;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent kind -> percentage map; clones share the same storage
#[derive(Debug, Clone)]
pub struct SamplingRateStore {
    rates: Arc<DashMap<TelemetryKind, f64, RandomState>>,
}

impl SamplingRateStore {
    pub fn new() -> Self {
        Self {
            rates: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    #[inline]
    pub fn set(&self, kind: TelemetryKind, percentage: f64) {
        self.rates.insert(kind, percentage);
    }

    #[inline]
    pub fn get(&self, kind: TelemetryKind) -> Option<f64> {
        self.rates.get(&kind).map(|rate| *rate)
    }

    pub fn snapshot(&self) -> HashMap<TelemetryKind, f64> {
        self.rates
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    pub fn clear(&self) {
        self.rates.clear();
    }
}

impl Default for SamplingRateStore {
    fn default() -> Self {
        Self::new()
    }
}
