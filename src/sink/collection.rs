/*!
 * Sink Collection
 * Insertion-ordered sinks with one permanent default
 */

use super::TelemetrySink;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct SinkList {
    sinks: Vec<Arc<TelemetrySink>>,
    default: Option<Arc<TelemetrySink>>,
}

/// Ordered sink set; clones share the same list.
///
/// The first sink added becomes the default (tracked by identity) and can
/// never be removed. Iteration order is fan-out order.
#[derive(Clone, Default)]
pub struct TelemetrySinkCollection {
    inner: Arc<RwLock<SinkList>>,
}

impl TelemetrySinkCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, sink: Arc<TelemetrySink>) {
        let mut list = self.inner.write();
        if list.default.is_none() {
            list.default = Some(Arc::clone(&sink));
        }
        list.sinks.push(sink);
    }

    /// Remove by identity. Removing the default sink is a no-op.
    pub fn remove(&self, sink: &Arc<TelemetrySink>) -> bool {
        let mut list = self.inner.write();
        if list
            .default
            .as_ref()
            .is_some_and(|default| Arc::ptr_eq(default, sink))
        {
            debug!(sink = %sink.name(), "Ignoring removal of default sink");
            return false;
        }

        let before = list.sinks.len();
        list.sinks.retain(|existing| !Arc::ptr_eq(existing, sink));
        list.sinks.len() != before
    }

    pub fn default_sink(&self) -> Option<Arc<TelemetrySink>> {
        self.inner.read().default.clone()
    }

    pub fn is_default(&self, sink: &Arc<TelemetrySink>) -> bool {
        self.inner
            .read()
            .default
            .as_ref()
            .is_some_and(|default| Arc::ptr_eq(default, sink))
    }

    pub fn contains(&self, sink: &Arc<TelemetrySink>) -> bool {
        self.inner
            .read()
            .sinks
            .iter()
            .any(|existing| Arc::ptr_eq(existing, sink))
    }

    /// First sink with the given name
    pub fn find(&self, name: &str) -> Option<Arc<TelemetrySink>> {
        self.inner
            .read()
            .sinks
            .iter()
            .find(|sink| sink.name() == name)
            .cloned()
    }

    /// Ordered copy of the current sinks
    pub fn snapshot(&self) -> Vec<Arc<TelemetrySink>> {
        self.inner.read().sinks.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().sinks.is_empty()
    }
}

impl std::fmt::Debug for TelemetrySinkCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.snapshot().iter()).finish()
    }
}
