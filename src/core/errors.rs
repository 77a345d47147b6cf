/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use miette::Diagnostic;
use thiserror::Error;

/// Connection string validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConnectionStringError {
    #[error("Connection string is empty")]
    #[diagnostic(
        code(connection_string::empty),
        help("Provide at least an InstrumentationKey=<key> pair.")
    )]
    Empty,

    #[error("Connection string exceeds {max} characters (got {len})")]
    #[diagnostic(
        code(connection_string::too_long),
        help("Remove unused settings from the connection string.")
    )]
    TooLong { len: usize, max: usize },

    #[error("Malformed connection string segment: '{0}'")]
    #[diagnostic(
        code(connection_string::malformed_segment),
        help("Every segment must have the form Key=Value and be separated by ';'.")
    )]
    MalformedSegment(String),

    #[error("Duplicate connection string key: {0}")]
    #[diagnostic(
        code(connection_string::duplicate_key),
        help("Keys are case-insensitive; each may appear only once.")
    )]
    DuplicateKey(String),

    #[error("Connection string is missing InstrumentationKey")]
    #[diagnostic(
        code(connection_string::missing_instrumentation_key),
        help("Add InstrumentationKey=<key> to the connection string.")
    )]
    MissingInstrumentationKey,

    #[error("Invalid endpoint for {key}: '{value}'")]
    #[diagnostic(
        code(connection_string::invalid_endpoint),
        help("Endpoints must be absolute http:// or https:// URIs with a host.")
    )]
    InvalidEndpoint { key: String, value: String },
}

/// Unified telemetry configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum TelemetryError {
    #[error("Invalid argument '{name}': {reason}")]
    #[diagnostic(
        code(telemetry::invalid_argument),
        help("Check the value passed to the configuration API.")
    )]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Connection string error: {0}")]
    #[diagnostic(transparent)]
    ConnectionString(#[from] ConnectionStringError),

    #[error("Configuration initialization failed: {0}")]
    #[diagnostic(
        code(telemetry::initialization_failed),
        help("The configuration factory rejected the instance. The next access retries.")
    )]
    Initialization(String),
}

impl TelemetryError {
    /// Argument error for an absent value
    pub fn null_argument(name: &'static str) -> Self {
        TelemetryError::InvalidArgument {
            name,
            reason: "value must not be null".to_string(),
        }
    }

    /// Argument error for an empty or whitespace-only value
    pub fn blank_argument(name: &'static str) -> Self {
        TelemetryError::InvalidArgument {
            name,
            reason: "value must not be empty or whitespace".to_string(),
        }
    }
}

/// Common result type for telemetry configuration operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;
