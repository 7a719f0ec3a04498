//! # Validator Cache Module
//!
//! Memoizes compiled request validators so schema composition and
//! compilation happen at most once per distinct route and content type.
//!
//! ## Cache Key Structure
//!
//! Keys render as `{method}-{route}-{content_type}`, for example
//! `POST-/pets-application/json` or `GET-/pets/{id}-not_provided`:
//! - `method`: HTTP method of the request
//! - `route`: matched route template, not the concrete path
//! - `content_type`: media type family of the request body, or
//!   `not_provided`
//!
//! The key space is bounded by the contract, so entries are never evicted.
//! [`ValidatorCache::clear`] drops everything when the contract is reloaded.
//!
//! ## Thread Safety
//!
//! The cache is an `Arc<RwLock<HashMap>>`:
//! - lookups take the read lock only
//! - builders run outside any lock, so concurrent first requests for one key
//!   may each build a validator
//! - insertion re-checks under the write lock; the first stored validator
//!   wins and later builders adopt it, so every caller of a key ends up with
//!   the same `Arc`
//!
//! ## Configuration
//!
//! Memoization can be disabled with `OARV_SCHEMA_CACHE=off`, see
//! [`RequestValidatorOptions`](crate::runtime_config::RequestValidatorOptions).

use crate::validator::CompiledRequestValidator;
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// `(method, route template, content-type family)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: Method,
    pub route: String,
    pub content_type: String,
}

impl CacheKey {
    pub fn new(method: Method, route: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            method,
            route: route.into(),
            content_type: content_type.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.method, self.route, self.content_type)
    }
}

/// Thread-safe cache of compiled validators.
///
/// # Example
///
/// ```rust
/// use openapi_request_validator::validator_cache::{CacheKey, ValidatorCache};
/// use http::Method;
///
/// let cache: ValidatorCache<String> = ValidatorCache::new(true);
/// let key = CacheKey::new(Method::GET, "/pets", "not_provided");
///
/// let first = cache.get_or_build(&key, || Ok::<_, ()>("compiled".to_string())).unwrap();
/// let second = cache.get_or_build(&key, || Ok::<_, ()>("compiled again".to_string())).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.build_count(), 1);
/// ```
pub struct ValidatorCache<V = CompiledRequestValidator> {
    cache: Arc<RwLock<HashMap<CacheKey, Arc<V>>>>,
    /// When false every lookup builds and nothing is stored
    enabled: bool,
    builds: Arc<AtomicUsize>,
}

impl<V> Clone for ValidatorCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            enabled: self.enabled,
            builds: Arc::clone(&self.builds),
        }
    }
}

impl<V> fmt::Debug for ValidatorCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("enabled", &self.enabled)
            .field("size", &self.size())
            .field("builds", &self.build_count())
            .finish()
    }
}

impl<V> ValidatorCache<V> {
    pub fn new(enabled: bool) -> Self {
        info!(enabled = enabled, "Initializing request validator cache");
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            enabled,
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached validator for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    /// Return the cached validator for `key`, building and storing it on a
    /// miss. Build errors are returned and nothing is cached.
    ///
    /// # Performance
    ///
    /// - Cache hit: read lock + HashMap lookup
    /// - Cache miss: `build` outside the lock, then a write lock for insertion
    pub fn get_or_build<F, E>(&self, key: &CacheKey, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if !self.enabled {
            self.builds.fetch_add(1, Ordering::Relaxed);
            return build().map(Arc::new);
        }

        if let Some(validator) = self.get(key) {
            debug!(cache_key = %key, "Request validator cache hit");
            return Ok(validator);
        }

        self.builds.fetch_add(1, Ordering::Relaxed);
        let built = Arc::new(build()?);

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = cache.get(key) {
            debug!(cache_key = %key, "Request validator built concurrently, reusing stored one");
            return Ok(Arc::clone(existing));
        }
        cache.insert(key.clone(), Arc::clone(&built));
        info!(
            cache_key = %key,
            cache_size = cache.len(),
            "Request validator compiled and cached"
        );
        Ok(built)
    }

    /// Number of cached validators.
    pub fn size(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of times a builder ran, including concurrent duplicates and
    /// failed builds.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Drop every cached validator, e.g. after the contract changed.
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        let dropped = cache.len();
        cache.clear();
        info!(dropped = dropped, "Request validator cache cleared");
    }
}
