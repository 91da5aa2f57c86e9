//! TTL cache for the site-wide defaults singleton.
//!
//! Readers get the cached value while it is fresh; a stale or empty slot
//! triggers one refresh. Concurrent refreshes are not coordinated: the last
//! write wins, which is fine for advisory fallback data.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use seoforge_core::{Clock, ContentHost, GlobalDefaults, SystemClock};

/// A value together with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CachedValue<T> {
    pub fn new(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self { value, fetched_at }
    }

    /// Stale once `ttl` has fully elapsed. A zero TTL is always stale.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age_ms = (now - self.fetched_at).num_milliseconds();
        age_ms >= ttl.as_millis().min(i64::MAX as u128) as i64
    }
}

/// Clock-injected cache of [`GlobalDefaults`].
pub struct GlobalDefaultsCache {
    slot: RwLock<Option<CachedValue<GlobalDefaults>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl GlobalDefaultsCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value if still fresh.
    pub fn peek(&self) -> Option<GlobalDefaults> {
        let now = self.clock.now();
        self.read()
            .as_ref()
            .filter(|cached| !cached.is_stale(now, self.ttl))
            .map(|cached| cached.value.clone())
    }

    /// Fresh defaults, refreshed from `host` when stale.
    ///
    /// A failed refresh keeps serving the previous value (or empty defaults)
    /// and is retried on the next call.
    pub async fn get(&self, host: &dyn ContentHost) -> GlobalDefaults {
        if let Some(value) = self.peek() {
            return value;
        }

        match host.global_defaults().await {
            Ok(value) => {
                debug!(ttl_ms = self.ttl.as_millis() as u64, "Global defaults refreshed");
                self.store(value.clone());
                value
            }
            Err(e) => {
                error!(error = %e, "Failed to load global defaults");
                self.read()
                    .as_ref()
                    .map(|cached| cached.value.clone())
                    .unwrap_or_default()
            }
        }
    }

    /// Replace the cached value, stamped with the current time.
    pub fn store(&self, value: GlobalDefaults) {
        let fetched_at = self.clock.now();
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) =
            Some(CachedValue::new(value, fetched_at));
    }

    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<CachedValue<GlobalDefaults>>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner())
    }
}
