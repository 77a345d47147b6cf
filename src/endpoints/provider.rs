/*!
 * Endpoint Provider
 * Resolves service endpoints from a parsed connection string
 */

use super::connection_string::{keys, ConnectionString};
use crate::core::errors::ConnectionStringError;
use crate::core::limits::{
    DEFAULT_INGESTION_ENDPOINT, DEFAULT_LIVE_ENDPOINT, DEFAULT_PROFILER_ENDPOINT,
    DEFAULT_SNAPSHOT_ENDPOINT,
};

/// Services addressable through a connection string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointName {
    Ingestion,
    Live,
    Profiler,
    Snapshot,
}

impl EndpointName {
    pub const ALL: [EndpointName; 4] = [
        EndpointName::Ingestion,
        EndpointName::Live,
        EndpointName::Profiler,
        EndpointName::Snapshot,
    ];

    /// Explicit override key in the connection string
    pub fn settings_key(&self) -> &'static str {
        match self {
            EndpointName::Ingestion => keys::INGESTION_ENDPOINT,
            EndpointName::Live => keys::LIVE_ENDPOINT,
            EndpointName::Profiler => keys::PROFILER_ENDPOINT,
            EndpointName::Snapshot => keys::SNAPSHOT_ENDPOINT,
        }
    }

    /// Host prefix used with `EndpointSuffix`
    pub fn prefix(&self) -> &'static str {
        match self {
            EndpointName::Ingestion => "dc",
            EndpointName::Live => "live",
            EndpointName::Profiler => "profiler",
            EndpointName::Snapshot => "snapshot",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            EndpointName::Ingestion => DEFAULT_INGESTION_ENDPOINT,
            EndpointName::Live => DEFAULT_LIVE_ENDPOINT,
            EndpointName::Profiler => DEFAULT_PROFILER_ENDPOINT,
            EndpointName::Snapshot => DEFAULT_SNAPSHOT_ENDPOINT,
        }
    }
}

/// Endpoint resolution over a single connection string
#[derive(Debug, Clone)]
pub struct EndpointProvider {
    parsed: ConnectionString,
}

impl EndpointProvider {
    pub fn parse(connection_string: &str) -> Result<Self, ConnectionStringError> {
        Ok(Self {
            parsed: ConnectionString::parse(connection_string)?,
        })
    }

    pub fn connection_string(&self) -> &ConnectionString {
        &self.parsed
    }

    pub fn instrumentation_key(&self) -> Result<&str, ConnectionStringError> {
        self.parsed
            .get(keys::INSTRUMENTATION_KEY)
            .ok_or(ConnectionStringError::MissingInstrumentationKey)
    }

    /// Resolve one endpoint.
    ///
    /// Precedence: explicit `<Name>Endpoint` key, then `EndpointSuffix`
    /// (with optional `Location`), then the cloud default. The result always
    /// ends with `/`.
    pub fn endpoint(&self, name: EndpointName) -> Result<String, ConnectionStringError> {
        if let Some(explicit) = self.parsed.get(name.settings_key()) {
            return normalize_endpoint(name.settings_key(), explicit);
        }

        if let Some(suffix) = self.parsed.get(keys::ENDPOINT_SUFFIX) {
            let suffix = suffix.trim_start_matches('.');
            let host = match self.parsed.get(keys::LOCATION) {
                Some(location) => format!(
                    "{}.{}.{}",
                    location.trim_end_matches('.'),
                    name.prefix(),
                    suffix
                ),
                None => format!("{}.{}", name.prefix(), suffix),
            };
            return normalize_endpoint(keys::ENDPOINT_SUFFIX, &format!("https://{}", host));
        }

        Ok(name.default_endpoint().to_string())
    }
}

/// Validate an absolute http(s) URI with a host and force a trailing `/`
fn normalize_endpoint(key: &str, value: &str) -> Result<String, ConnectionStringError> {
    let invalid = || ConnectionStringError::InvalidEndpoint {
        key: key.to_string(),
        value: value.to_string(),
    };

    let lower = value.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .ok_or_else(invalid)?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host_valid = !host.is_empty()
        && !host.starts_with(':')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && !host.contains("..");
    // a trailing path is appended later, so query and fragment cannot be kept
    let has_suffix_parts = value.contains(['?', '#']);
    if !host_valid || has_suffix_parts || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    if value.ends_with('/') {
        Ok(value.to_string())
    } else {
        Ok(format!("{}/", value))
    }
}
