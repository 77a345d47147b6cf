/*!
 * Processor Chain Builder
 */

use super::chain::ProcessorChain;
use super::sampling::{Sampler, SamplingProcessor};
use super::{ChainTerminal, TelemetryProcessor};
use crate::sampling::SamplingRateStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

type ProcessorFactory = Box<dyn Fn() -> Box<dyn TelemetryProcessor> + Send + Sync>;

/// Accumulates stage factories; `build` yields an immutable chain
pub struct ProcessorChainBuilder {
    factories: Mutex<Vec<ProcessorFactory>>,
    rates: SamplingRateStore,
}

impl ProcessorChainBuilder {
    pub fn new(rates: SamplingRateStore) -> Self {
        Self {
            factories: Mutex::new(Vec::new()),
            rates,
        }
    }

    /// Register a stage; `factory` runs once per build
    pub fn use_processor<P, F>(&self, factory: F) -> &Self
    where
        P: TelemetryProcessor + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.factories
            .lock()
            .push(Box::new(move || Box::new(factory()) as Box<dyn TelemetryProcessor>));
        self
    }

    /// Register a sampling stage recording its rates in the shared store
    pub fn use_sampling(&self, sampler: Arc<dyn Sampler>) -> &Self {
        let rates = self.rates.clone();
        self.use_processor(move || SamplingProcessor::new(Arc::clone(&sampler), rates.clone()))
    }

    pub fn len(&self) -> usize {
        self.factories.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.lock().is_empty()
    }

    /// Instantiate every registered stage, in order, ending in `terminal`
    pub fn build(&self, terminal: Arc<dyn ChainTerminal>) -> ProcessorChain {
        let stages: Vec<Box<dyn TelemetryProcessor>> =
            self.factories.lock().iter().map(|factory| factory()).collect();
        debug!(stages = stages.len(), "Processor chain built");
        ProcessorChain::new(stages, terminal)
    }
}

impl Default for ProcessorChainBuilder {
    fn default() -> Self {
        Self::new(SamplingRateStore::new())
    }
}
