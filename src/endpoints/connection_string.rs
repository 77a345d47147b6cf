/*!
 * Connection String Parsing
 * `Key=Value;Key=Value` grammar with case-insensitive keys
 */

use crate::core::errors::ConnectionStringError;
use crate::core::limits::{
    CONNECTION_STRING_KEY_VALUE_SEPARATOR, CONNECTION_STRING_SEPARATOR,
    MAX_CONNECTION_STRING_LENGTH,
};
use std::collections::HashMap;

/// Well-known connection string keys
pub mod keys {
    pub const INSTRUMENTATION_KEY: &str = "InstrumentationKey";
    pub const ENDPOINT_SUFFIX: &str = "EndpointSuffix";
    pub const LOCATION: &str = "Location";
    pub const INGESTION_ENDPOINT: &str = "IngestionEndpoint";
    pub const LIVE_ENDPOINT: &str = "LiveEndpoint";
    pub const PROFILER_ENDPOINT: &str = "ProfilerEndpoint";
    pub const SNAPSHOT_ENDPOINT: &str = "SnapshotEndpoint";
}

/// Parsed connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    // lowercase key -> trimmed value
    values: HashMap<String, String>,
}

impl ConnectionString {
    /// Parse and validate the pair grammar. Endpoint values are validated
    /// separately by the endpoint provider.
    pub fn parse(input: &str) -> Result<Self, ConnectionStringError> {
        if input.trim().is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        let len = input.chars().count();
        if len > MAX_CONNECTION_STRING_LENGTH {
            return Err(ConnectionStringError::TooLong {
                len,
                max: MAX_CONNECTION_STRING_LENGTH,
            });
        }

        let mut values = HashMap::new();
        for segment in input.split(CONNECTION_STRING_SEPARATOR) {
            if segment.trim().is_empty() {
                continue;
            }

            let (key, value) = segment
                .split_once(CONNECTION_STRING_KEY_VALUE_SEPARATOR)
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.trim().to_string()))?;

            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return Err(ConnectionStringError::MalformedSegment(
                    segment.trim().to_string(),
                ));
            }

            if values
                .insert(key.to_ascii_lowercase(), value.to_string())
                .is_some()
            {
                return Err(ConnectionStringError::DuplicateKey(key.to_string()));
            }
        }

        if values.is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        Ok(Self { values })
    }

    /// Case-insensitive lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
