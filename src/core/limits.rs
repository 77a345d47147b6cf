/*!
 * Limits and Constants
 *
 * Centralized location for endpoint defaults, connection string limits and
 * pipeline tunables.
 */

use std::time::Duration;

// =============================================================================
// CONNECTION STRING
// =============================================================================

/// Maximum accepted connection string length (characters)
/// [SECURITY] Bounds parsing work on untrusted configuration input
pub const MAX_CONNECTION_STRING_LENGTH: usize = 4096;

/// Segment separator between `key=value` pairs
pub const CONNECTION_STRING_SEPARATOR: char = ';';

/// Separator between key and value inside a segment
pub const CONNECTION_STRING_KEY_VALUE_SEPARATOR: char = '=';

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Default cloud ingestion endpoint
pub const DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com/";

/// Default live metrics endpoint
pub const DEFAULT_LIVE_ENDPOINT: &str = "https://rt.services.visualstudio.com/";

/// Default profiler endpoint
pub const DEFAULT_PROFILER_ENDPOINT: &str = "https://agent.azureserviceprofiler.net/";

/// Default snapshot debugger endpoint (shares the profiler agent host)
pub const DEFAULT_SNAPSHOT_ENDPOINT: &str = "https://agent.azureserviceprofiler.net/";

/// Path appended to the ingestion endpoint for telemetry submission
pub const INGESTION_TRACK_PATH: &str = "v2/track";

/// Path template appended to the ingestion endpoint for application-id lookup.
/// `{0}` is replaced with the instrumentation key.
pub const APPLICATION_ID_PATH: &str = "api/profiles/{0}/appId";

/// Path appended to the live endpoint for quick pulse
pub const QUICK_PULSE_PATH: &str = "QuickPulseService.svc";

// =============================================================================
// SINKS
// =============================================================================

/// Reserved name of the sink created with every configuration
pub const DEFAULT_SINK_NAME: &str = "default";

// =============================================================================
// METRICS
// =============================================================================

/// Default aggregation cycle period
pub const DEFAULT_AGGREGATION_INTERVAL: Duration = Duration::from_secs(60);

/// Thread name used by the background aggregation cycle
pub const AGGREGATION_THREAD_NAME: &str = "metric-aggregation";

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Environment variable carrying a full connection string
pub const ENV_CONNECTION_STRING: &str = "APPLICATIONINSIGHTS_CONNECTION_STRING";

/// Legacy environment variable carrying only an instrumentation key
pub const ENV_INSTRUMENTATION_KEY: &str = "APPINSIGHTS_INSTRUMENTATIONKEY";

/// Enables JSON formatted diagnostics output
pub const ENV_TRACE_JSON: &str = "TELEMETRY_TRACE_JSON";
