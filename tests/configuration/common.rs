/*!
 * Shared fixtures for configuration tests
 */

use ai_os_telemetry::{TelemetryChannel, TelemetryItem};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Channel without endpoint assignment support
#[derive(Default)]
pub struct FixedChannel {
    pub sent: Mutex<Vec<TelemetryItem>>,
    pub flushes: AtomicU64,
}

impl TelemetryChannel for FixedChannel {
    fn send(&self, item: TelemetryItem) {
        self.sent.lock().push(item);
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}
