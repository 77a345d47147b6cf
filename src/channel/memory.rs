/*!
 * In-Memory Channel
 * First-party channel buffering items until drained
 */

use super::{EndpointTarget, TelemetryChannel};
use crate::core::types::TelemetryItem;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Buffers delivered items; transmission is left to whoever drains it
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    buffer: Mutex<Vec<TelemetryItem>>,
    endpoint: RwLock<Option<String>>,
    flushes: AtomicU64,
    disposed: AtomicBool,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(address: impl Into<String>) -> Self {
        let channel = Self::default();
        *channel.endpoint.write() = Some(address.into());
        channel
    }

    /// Take every buffered item
    pub fn drain(&self) -> Vec<TelemetryItem> {
        std::mem::take(&mut *self.buffer.lock())
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl TelemetryChannel for InMemoryChannel {
    fn send(&self, item: TelemetryItem) {
        if self.is_disposed() {
            debug!(item = %item.id, "Dropping item sent to disposed channel");
            return;
        }
        self.buffer.lock().push(item);
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::AcqRel);
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            let pending = self.len();
            debug!(pending, "In-memory channel disposed");
        }
    }

    fn endpoint_target(&self) -> Option<&dyn EndpointTarget> {
        Some(self)
    }
}

impl EndpointTarget for InMemoryChannel {
    fn endpoint_address(&self) -> Option<String> {
        self.endpoint.read().clone()
    }

    fn set_endpoint_address(&self, address: &str) {
        *self.endpoint.write() = Some(address.to_string());
    }
}
