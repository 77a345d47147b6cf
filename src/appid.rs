/*!
 * Application-Id Providers
 * Resolve a stable application identifier from an instrumentation key
 *
 * Providers:
 * - `ProfileApplicationIdProvider`: first-party, queries the profile endpoint
 * - `DictionaryApplicationIdProvider`: static key -> id map
 * - `FallbackApplicationIdProvider`: dictionary first, then one delegate
 */

use crate::channel::EndpointTarget;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves application ids for cross-component correlation
pub trait ApplicationIdProvider: Send + Sync {
    fn application_id(&self, instrumentation_key: &str) -> Option<String>;

    /// `Some` when the profile-query endpoint can be reassigned
    fn endpoint_target(&self) -> Option<&dyn EndpointTarget> {
        None
    }

    /// The provider this one delegates to, if it is a composite
    fn fallback(&self) -> Option<&Arc<dyn ApplicationIdProvider>> {
        None
    }
}

/// Point `provider` (or its direct delegate) at a new profile-query endpoint.
/// Returns whether a provider accepted the address.
pub fn propagate_profile_endpoint(provider: &dyn ApplicationIdProvider, address: &str) -> bool {
    if let Some(target) = provider.endpoint_target() {
        target.set_endpoint_address(address);
        return true;
    }

    if let Some(target) = provider.fallback().and_then(|inner| inner.endpoint_target()) {
        target.set_endpoint_address(address);
        return true;
    }

    false
}

/// Lookup performed against a formatted profile-query URL
pub type ProfileLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// First-party provider querying the profile endpoint, with a per-key cache
pub struct ProfileApplicationIdProvider {
    profile_query_endpoint: RwLock<Option<String>>,
    lookup: Box<ProfileLookup>,
    cache: DashMap<String, String, RandomState>,
}

impl ProfileApplicationIdProvider {
    pub fn new<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            profile_query_endpoint: RwLock::new(None),
            lookup: Box::new(lookup),
            cache: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn profile_query_endpoint(&self) -> Option<String> {
        self.profile_query_endpoint.read().clone()
    }
}

impl ApplicationIdProvider for ProfileApplicationIdProvider {
    fn application_id(&self, instrumentation_key: &str) -> Option<String> {
        if let Some(cached) = self.cache.get(instrumentation_key) {
            return Some(cached.clone());
        }

        let Some(template) = self.profile_query_endpoint() else {
            warn!("Profile query endpoint not configured; cannot resolve application id");
            return None;
        };

        let url = template.replace("{0}", instrumentation_key);
        let resolved = (self.lookup)(&url)?;
        debug!(url = %url, "Resolved application id");
        self.cache
            .insert(instrumentation_key.to_string(), resolved.clone());
        Some(resolved)
    }

    fn endpoint_target(&self) -> Option<&dyn EndpointTarget> {
        Some(self)
    }
}

impl EndpointTarget for ProfileApplicationIdProvider {
    fn endpoint_address(&self) -> Option<String> {
        self.profile_query_endpoint()
    }

    fn set_endpoint_address(&self, address: &str) {
        *self.profile_query_endpoint.write() = Some(address.to_string());
        // ids are scoped to the endpoint they came from
        self.cache.clear();
    }
}

/// Static map of instrumentation key to application id
#[derive(Debug, Default, Clone)]
pub struct DictionaryApplicationIdProvider {
    defined: HashMap<String, String>,
}

impl DictionaryApplicationIdProvider {
    pub fn new(defined: HashMap<String, String>) -> Self {
        Self { defined }
    }
}

impl ApplicationIdProvider for DictionaryApplicationIdProvider {
    fn application_id(&self, instrumentation_key: &str) -> Option<String> {
        self.defined.get(instrumentation_key).cloned()
    }
}

/// Dictionary lookup with one delegated provider behind it
pub struct FallbackApplicationIdProvider {
    dictionary: DictionaryApplicationIdProvider,
    next: Arc<dyn ApplicationIdProvider>,
}

impl FallbackApplicationIdProvider {
    pub fn new(dictionary: DictionaryApplicationIdProvider, next: Arc<dyn ApplicationIdProvider>) -> Self {
        Self { dictionary, next }
    }
}

impl ApplicationIdProvider for FallbackApplicationIdProvider {
    fn application_id(&self, instrumentation_key: &str) -> Option<String> {
        self.dictionary
            .application_id(instrumentation_key)
            .or_else(|| self.next.application_id(instrumentation_key))
    }

    fn fallback(&self) -> Option<&Arc<dyn ApplicationIdProvider>> {
        Some(&self.next)
    }
}
