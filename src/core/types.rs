/*!
 * Core Types
 * Telemetry item shape shared by initializers, processors and channels
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;
use uuid::Uuid;

/// Telemetry item discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    Event,
    Request,
    Dependency,
    Exception,
    Trace,
    Metric,
    PageView,
    Availability,
}

impl TelemetryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryKind::Event => "event",
            TelemetryKind::Request => "request",
            TelemetryKind::Dependency => "dependency",
            TelemetryKind::Exception => "exception",
            TelemetryKind::Trace => "trace",
            TelemetryKind::Metric => "metric",
            TelemetryKind::PageView => "page_view",
            TelemetryKind::Availability => "availability",
        }
    }
}

/// A single telemetry record flowing through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryItem {
    pub id: Uuid,
    pub kind: TelemetryKind,
    pub name: String,
    pub timestamp: SystemTime,
    pub instrumentation_key: String,
    pub properties: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Sampling percentage applied before delivery, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
}

impl TelemetryItem {
    pub fn new(kind: TelemetryKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            timestamp: SystemTime::now(),
            instrumentation_key: String::new(),
            properties: HashMap::new(),
            value: None,
            sample_rate: None,
        }
    }

    /// Custom event
    pub fn event(name: impl Into<String>) -> Self {
        Self::new(TelemetryKind::Event, name)
    }

    /// Metric sample carrying a value
    pub fn metric(name: impl Into<String>, value: f64) -> Self {
        Self::new(TelemetryKind::Metric, name).with_value(value)
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_instrumentation_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation_key = key.into();
        self
    }
}
