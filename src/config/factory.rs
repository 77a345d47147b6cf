/*!
 * Configuration Factory
 * External wiring applied to fresh configurations before they are handed out
 *
 * Environment variables (default factory):
 * - APPLICATIONINSIGHTS_CONNECTION_STRING: full connection string
 * - APPINSIGHTS_INSTRUMENTATIONKEY: instrumentation key only (legacy)
 */

use super::TelemetryConfiguration;
use crate::core::errors::TelemetryResult;
use crate::core::limits::{ENV_CONNECTION_STRING, ENV_INSTRUMENTATION_KEY};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Component initialized against a configuration during factory wiring.
/// Same restriction as the factory: touch only the given instance.
pub trait TelemetryModule: Send + Sync {
    fn name(&self) -> &str;
    fn initialize(&self, config: &TelemetryConfiguration);
}

/// Registry of modules handed to the factory
#[derive(Default)]
pub struct TelemetryModules {
    modules: RwLock<Vec<Arc<dyn TelemetryModule>>>,
}

impl TelemetryModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, module: Arc<dyn TelemetryModule>) {
        self.modules.write().push(module);
    }

    pub fn modules(&self) -> Vec<Arc<dyn TelemetryModule>> {
        self.modules.read().clone()
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}

/// Declarative wiring of a configuration instance.
///
/// Implementations wire only the instance they are given. Asking the owning
/// registry for `active()` from here fails with an initialization error.
pub trait ConfigurationFactory: Send + Sync {
    fn initialize(
        &self,
        config: &TelemetryConfiguration,
        modules: Option<&TelemetryModules>,
        serialized: Option<&str>,
    ) -> TelemetryResult<()>;
}

type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Default factory: environment-driven key/endpoint setup plus module init.
/// Serialized configuration text is accepted but not interpreted.
pub struct EnvironmentConfigurationFactory {
    lookup: Box<EnvLookup>,
}

impl EnvironmentConfigurationFactory {
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Use a custom variable source instead of the process environment
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn non_blank(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }
}

impl Default for EnvironmentConfigurationFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationFactory for EnvironmentConfigurationFactory {
    fn initialize(
        &self,
        config: &TelemetryConfiguration,
        modules: Option<&TelemetryModules>,
        serialized: Option<&str>,
    ) -> TelemetryResult<()> {
        if let Some(text) = serialized {
            debug!(len = text.len(), "Serialized configuration supplied; not interpreted by default factory");
        }

        if let Some(connection_string) = self.non_blank(ENV_CONNECTION_STRING) {
            config.set_connection_string(Some(&connection_string))?;
            info!("Connection string applied from environment");
        } else if let Some(key) = self.non_blank(ENV_INSTRUMENTATION_KEY) {
            config.set_instrumentation_key(Some(&key))?;
            info!("Instrumentation key applied from environment");
        }

        if let Some(modules) = modules {
            for module in modules.modules() {
                module.initialize(config);
                debug!(module = module.name(), "Telemetry module initialized");
            }
        }

        Ok(())
    }
}
