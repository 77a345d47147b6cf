/*!
 * Metric Aggregation
 * Pre-aggregates metric values and periodically hands them to a consumer
 *
 * A background aggregation cycle flushes every interval until stopped.
 * Stopping is a signal; the worker exits on its own without the caller
 * waiting for it, unless `shutdown` is used.
 */

use crate::core::limits::{AGGREGATION_THREAD_NAME, DEFAULT_AGGREGATION_INTERVAL};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Aggregated view of one metric series over a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregate {
    pub name: String,
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricAggregate {
    fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn observe(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

/// Receives aggregates on every flush
pub trait MetricConsumer: Send + Sync {
    fn consume(&self, aggregates: Vec<MetricAggregate>);
}

/// Tunables for a metric manager
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricManagerOptions {
    pub aggregation_interval_ms: u64,
}

impl MetricManagerOptions {
    pub fn aggregation_interval(&self) -> Duration {
        Duration::from_millis(self.aggregation_interval_ms.max(1))
    }
}

impl Default for MetricManagerOptions {
    fn default() -> Self {
        Self {
            aggregation_interval_ms: DEFAULT_AGGREGATION_INTERVAL.as_millis() as u64,
        }
    }
}

struct AggregatorState {
    series: DashMap<String, MetricAggregate, RandomState>,
    consumer: Arc<dyn MetricConsumer>,
}

impl AggregatorState {
    fn flush(&self) -> usize {
        let names: Vec<String> = self.series.iter().map(|entry| entry.key().clone()).collect();
        let mut aggregates: Vec<MetricAggregate> = names
            .iter()
            .filter_map(|name| self.series.remove(name).map(|(_, aggregate)| aggregate))
            .collect();

        if aggregates.is_empty() {
            return 0;
        }

        aggregates.sort_by(|a, b| a.name.cmp(&b.name));
        let count = aggregates.len();
        self.consumer.consume(aggregates);
        count
    }
}

struct AggregationCycle {
    stop: flume::Sender<()>,
    handle: JoinHandle<()>,
}

/// Aggregation engine with a background flush cycle
pub struct MetricManager {
    state: Arc<AggregatorState>,
    cycle: Mutex<Option<AggregationCycle>>,
    running: Arc<AtomicBool>,
}

impl MetricManager {
    /// Create a manager and start its aggregation cycle
    pub fn new(consumer: Arc<dyn MetricConsumer>, options: MetricManagerOptions) -> Self {
        let state = Arc::new(AggregatorState {
            series: DashMap::with_hasher(RandomState::new()),
            consumer,
        });
        let running = Arc::new(AtomicBool::new(false));
        let cycle = Self::start_cycle(&state, &running, options.aggregation_interval());

        Self {
            state,
            cycle: Mutex::new(cycle),
            running,
        }
    }

    fn start_cycle(
        state: &Arc<AggregatorState>,
        running: &Arc<AtomicBool>,
        interval: Duration,
    ) -> Option<AggregationCycle> {
        let (stop, stop_rx) = flume::bounded::<()>(1);
        let worker_state = Arc::clone(state);
        let worker_running = Arc::clone(running);
        running.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name(AGGREGATION_THREAD_NAME.to_string())
            .spawn(move || {
                while let Err(flume::RecvTimeoutError::Timeout) = stop_rx.recv_timeout(interval) {
                    worker_state.flush();
                }
                worker_running.store(false, Ordering::Release);
                debug!("Metric aggregation cycle exited");
            });

        match spawned {
            Ok(handle) => Some(AggregationCycle { stop, handle }),
            Err(e) => {
                running.store(false, Ordering::Release);
                warn!(error = %e, "Failed to start metric aggregation cycle; flush manually");
                None
            }
        }
    }

    /// Record one value for `name`
    pub fn track_value(&self, name: &str, value: f64) {
        self.state
            .series
            .entry(name.to_string())
            .and_modify(|aggregate| aggregate.observe(value))
            .or_insert_with(|| MetricAggregate::new(name, value));
    }

    /// Hand every pending aggregate to the consumer; returns the series count
    pub fn flush(&self) -> usize {
        self.state.flush()
    }

    /// Number of series with pending values
    pub fn pending_series(&self) -> usize {
        self.state.series.len()
    }

    pub fn is_cycle_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signal the cycle to stop without waiting for it (fire-and-forget)
    pub fn stop_cycle_async(&self) {
        if let Some(cycle) = self.cycle.lock().take() {
            let _ = cycle.stop.try_send(());
            // dropping the handle detaches the worker
            drop(cycle.handle);
            info!("Metric aggregation cycle stop requested");
        }
    }

    /// Stop the cycle and wait for the worker to exit
    pub fn shutdown(&self) {
        let Some(cycle) = self.cycle.lock().take() else {
            return;
        };
        let _ = cycle.stop.try_send(());

        if cycle.handle.thread().id() == thread::current().id() {
            return;
        }
        if cycle.handle.join().is_err() {
            warn!("Metric aggregation worker panicked");
        }
    }
}

impl Drop for MetricManager {
    fn drop(&mut self) {
        if let Some(cycle) = self.cycle.get_mut().take() {
            let _ = cycle.stop.try_send(());
        }
    }
}

impl std::fmt::Debug for MetricManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricManager")
            .field("pending_series", &self.pending_series())
            .field("cycle_running", &self.is_cycle_running())
            .finish()
    }
}
