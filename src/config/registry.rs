/*!
 * Configuration Registry
 * Owner of the "active" configuration with an explicit init/teardown lifecycle
 *
 * `active()` uses double-checked locking: a lock-free load once published,
 * a serialized slow path on first access. The factory runs before the
 * instance is published, and a failed initialization publishes nothing.
 */

use super::factory::{ConfigurationFactory, EnvironmentConfigurationFactory, TelemetryModules};
use super::{ConfigurationInner, TelemetryConfiguration};
use crate::core::errors::{TelemetryError, TelemetryResult};
use crate::core::sync::OnceSlot;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, LazyLock};
use std::thread::{self, ThreadId};
use tracing::{error, info};

static GLOBAL_REGISTRY: LazyLock<ConfigurationRegistry> = LazyLock::new(ConfigurationRegistry::new);

pub(crate) struct RegistryState {
    pub(crate) slot: OnceSlot<ConfigurationInner>,
    init_lock: Mutex<()>,
    // thread running the factory inside `active()`
    initializing: Mutex<Option<ThreadId>>,
    factory: RwLock<Arc<dyn ConfigurationFactory>>,
    modules: RwLock<Option<Arc<TelemetryModules>>>,
}

/// Injectable holder of an active configuration; clones share state
#[derive(Clone)]
pub struct ConfigurationRegistry {
    state: Arc<RegistryState>,
}

impl ConfigurationRegistry {
    /// Registry using the environment-driven default factory
    pub fn new() -> Self {
        Self::with_factory(Arc::new(EnvironmentConfigurationFactory::new()))
    }

    pub fn with_factory(factory: Arc<dyn ConfigurationFactory>) -> Self {
        Self {
            state: Arc::new(RegistryState {
                slot: OnceSlot::new(),
                init_lock: Mutex::new(()),
                initializing: Mutex::new(None),
                factory: RwLock::new(factory),
                modules: RwLock::new(None),
            }),
        }
    }

    /// Process-wide registry
    pub fn global() -> &'static ConfigurationRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn factory(&self) -> Arc<dyn ConfigurationFactory> {
        Arc::clone(&*self.state.factory.read())
    }

    pub fn set_factory(&self, factory: Arc<dyn ConfigurationFactory>) {
        *self.state.factory.write() = factory;
    }

    pub fn modules(&self) -> Option<Arc<TelemetryModules>> {
        self.state.modules.read().clone()
    }

    pub fn set_modules(&self, modules: Option<Arc<TelemetryModules>>) {
        *self.state.modules.write() = modules;
    }

    /// Published instance, if any, without creating one
    pub fn current(&self) -> Option<TelemetryConfiguration> {
        self.state.slot.get().map(TelemetryConfiguration::from_inner)
    }

    /// The active configuration, created and initialized on first access.
    ///
    /// Calling this from the registry's own factory while it initializes the
    /// active instance fails instead of blocking.
    pub fn active(&self) -> TelemetryResult<TelemetryConfiguration> {
        if let Some(inner) = self.state.slot.get() {
            return Ok(TelemetryConfiguration::from_inner(inner));
        }

        if *self.state.initializing.lock() == Some(thread::current().id()) {
            let err = TelemetryError::Initialization(
                "active() called while the active configuration is being initialized".to_string(),
            );
            error!(error = %err, "Re-entrant configuration access");
            return Err(err);
        }

        let _guard = self.state.init_lock.lock();
        if let Some(inner) = self.state.slot.get() {
            return Ok(TelemetryConfiguration::from_inner(inner));
        }

        *self.state.initializing.lock() = Some(thread::current().id());
        let initialized = self.initialize(TelemetryConfiguration::new(), None);
        *self.state.initializing.lock() = None;

        let config = initialized?;
        self.publish(&config);
        info!("Active telemetry configuration created");
        Ok(config)
    }

    /// Replace the active configuration; returns the one it displaced
    pub fn set_active(&self, config: &TelemetryConfiguration) -> Option<TelemetryConfiguration> {
        let _guard = self.state.init_lock.lock();
        self.publish(config)
    }

    /// Remove and dispose the active configuration
    pub fn teardown(&self) {
        let _guard = self.state.init_lock.lock();
        if let Some(inner) = self.state.slot.take() {
            TelemetryConfiguration::from_inner(inner).dispose();
            info!("Active telemetry configuration torn down");
        }
    }

    /// Fresh instance with factory initialization, not published
    pub fn create_default(&self) -> TelemetryResult<TelemetryConfiguration> {
        self.initialize(TelemetryConfiguration::new(), None)
    }

    /// Fresh instance initialized from serialized configuration text
    pub fn create_from_configuration(&self, text: Option<&str>) -> TelemetryResult<TelemetryConfiguration> {
        let text = match text {
            None => Err(TelemetryError::null_argument("config")),
            Some(text) if text.trim().is_empty() => Err(TelemetryError::blank_argument("config")),
            Some(text) => Ok(text),
        }
        .inspect_err(|e| error!(error = %e, "Rejected serialized configuration"))?;

        self.initialize(TelemetryConfiguration::new(), Some(text))
    }

    fn initialize(
        &self,
        config: TelemetryConfiguration,
        serialized: Option<&str>,
    ) -> TelemetryResult<TelemetryConfiguration> {
        let modules = self.modules();
        match self.factory().initialize(&config, modules.as_deref(), serialized) {
            Ok(()) => Ok(config),
            Err(e) => {
                error!(error = %e, "Configuration factory initialization failed");
                config.dispose();
                Err(TelemetryError::Initialization(e.to_string()))
            }
        }
    }

    fn publish(&self, config: &TelemetryConfiguration) -> Option<TelemetryConfiguration> {
        config.register_owner(Arc::downgrade(&self.state));
        self.state
            .slot
            .replace(Arc::clone(&config.inner))
            .filter(|previous| !Arc::ptr_eq(previous, &config.inner))
            .map(TelemetryConfiguration::from_inner)
    }
}

impl Default for ConfigurationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Active configuration of the process-wide registry
pub fn active() -> TelemetryResult<TelemetryConfiguration> {
    ConfigurationRegistry::global().active()
}
