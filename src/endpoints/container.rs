/*!
 * Endpoint Container
 * Immutable set of resolved service endpoints
 */

use super::provider::{EndpointName, EndpointProvider};
use crate::core::errors::ConnectionStringError;
use crate::core::limits::{APPLICATION_ID_PATH, INGESTION_TRACK_PATH, QUICK_PULSE_PATH};

/// Resolved endpoints. Built once, replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointContainer {
    ingestion: String,
    live: String,
    profiler: String,
    snapshot: String,
}

impl EndpointContainer {
    /// Resolve every endpoint through `provider`; fails on the first invalid one
    pub fn from_provider(provider: &EndpointProvider) -> Result<Self, ConnectionStringError> {
        Ok(Self {
            ingestion: provider.endpoint(EndpointName::Ingestion)?,
            live: provider.endpoint(EndpointName::Live)?,
            profiler: provider.endpoint(EndpointName::Profiler)?,
            snapshot: provider.endpoint(EndpointName::Snapshot)?,
        })
    }

    pub fn ingestion(&self) -> &str {
        &self.ingestion
    }

    pub fn live(&self) -> &str {
        &self.live
    }

    pub fn profiler(&self) -> &str {
        &self.profiler
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Telemetry submission URL
    pub fn formatted_ingestion_endpoint(&self) -> String {
        format!("{}{}", self.ingestion, INGESTION_TRACK_PATH)
    }

    /// Application-id lookup template; `{0}` is the instrumentation key
    pub fn formatted_application_id_endpoint(&self) -> String {
        format!("{}{}", self.ingestion, APPLICATION_ID_PATH)
    }

    pub fn formatted_quick_pulse_endpoint(&self) -> String {
        format!("{}{}", self.live, QUICK_PULSE_PATH)
    }
}

impl Default for EndpointContainer {
    fn default() -> Self {
        Self {
            ingestion: EndpointName::Ingestion.default_endpoint().to_string(),
            live: EndpointName::Live.default_endpoint().to_string(),
            profiler: EndpointName::Profiler.default_endpoint().to_string(),
            snapshot: EndpointName::Snapshot.default_endpoint().to_string(),
        }
    }
}
