/*!
 * Processor Chain
 */

use super::{ChainTerminal, TelemetryProcessor};
use crate::core::types::TelemetryItem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// What happened to an item sent through a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    Delivered,
    /// Dropped by the stage at this index
    Dropped { stage: usize },
    /// Chain already disposed
    Rejected,
}

/// Immutable ordered pipeline terminating in delivery
pub struct ProcessorChain {
    stages: Vec<Box<dyn TelemetryProcessor>>,
    terminal: Arc<dyn ChainTerminal>,
    disposed: AtomicBool,
}

impl ProcessorChain {
    pub fn new(stages: Vec<Box<dyn TelemetryProcessor>>, terminal: Arc<dyn ChainTerminal>) -> Self {
        Self {
            stages,
            terminal,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn process(&self, item: TelemetryItem) -> ChainOutcome {
        if self.is_disposed() {
            trace!(item = %item.id, "Chain disposed; item rejected");
            return ChainOutcome::Rejected;
        }

        let mut current = item;
        for (index, stage) in self.stages.iter().enumerate() {
            current = match stage.process(current) {
                Some(next) => next,
                None => return ChainOutcome::Dropped { stage: index },
            };
        }

        self.terminal.deliver(current);
        ChainOutcome::Delivered
    }

    /// Number of stages before the terminal
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Dispose each stage once; later calls are no-ops
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        for stage in &self.stages {
            stage.dispose();
        }
        debug!(stages = self.stages.len(), "Processor chain disposed");
    }
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorChain")
            .field("stages", &self.stages.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
