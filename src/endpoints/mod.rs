/*!
 * Endpoints
 * Connection string parsing and service endpoint resolution
 */

pub mod connection_string;
mod container;
mod provider;

pub use connection_string::ConnectionString;
pub use container::EndpointContainer;
pub use provider::{EndpointName, EndpointProvider};
