//! At-most-one-concurrent synthesis per document.
//!
//! A request whose key is already held is dropped, not queued. The key is
//! released when the guard drops, on every exit path including panics and
//! cancelled futures.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use seoforge_core::PublicationStatus;

/// Identity of one synthesis: model, document and publication status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SynthesisKey {
    pub model_uid: String,
    pub document_id: String,
    pub status: PublicationStatus,
}

impl SynthesisKey {
    pub fn new(
        model_uid: impl Into<String>,
        document_id: impl Into<String>,
        status: PublicationStatus,
    ) -> Self {
        Self {
            model_uid: model_uid.into(),
            document_id: document_id.into(),
            status,
        }
    }
}

impl fmt::Display for SynthesisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.model_uid, self.document_id, self.status)
    }
}

/// Shared set of in-flight [`SynthesisKey`]s. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<SynthesisKey>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` when another synthesis already holds it.
    pub fn try_acquire(&self, key: SynthesisKey) -> Option<InFlightGuard> {
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            registry: self.clone(),
            key,
        })
    }

    pub fn contains(&self, key: &SynthesisKey) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<SynthesisKey>> {
        self.keys.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Holds a key in its [`InFlightRegistry`] until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    key: SynthesisKey,
}

impl InFlightGuard {
    pub fn key(&self) -> &SynthesisKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(doc: &str) -> SynthesisKey {
        SynthesisKey::new("api::page.page", doc, PublicationStatus::Published)
    }

    #[test]
    fn test_second_acquire_is_rejected() {
        let registry = InFlightRegistry::new();
        let guard = registry.try_acquire(key("abc")).unwrap();
        assert!(registry.try_acquire(key("abc")).is_none());
        assert_eq!(guard.key().document_id, "abc");
    }

    #[test]
    fn test_drop_releases_key() {
        let registry = InFlightRegistry::new();
        {
            let _guard = registry.try_acquire(key("abc")).unwrap();
            assert!(registry.contains(&key("abc")));
        }
        assert!(registry.is_empty());
        assert!(registry.try_acquire(key("abc")).is_some());
    }

    #[test]
    fn test_status_is_part_of_key() {
        let registry = InFlightRegistry::new();
        let _published = registry.try_acquire(key("abc")).unwrap();
        let draft = SynthesisKey::new("api::page.page", "abc", PublicationStatus::Draft);
        assert!(registry.try_acquire(draft).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_released_on_panic() {
        let registry = InFlightRegistry::new();
        let shared = registry.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = shared.try_acquire(key("boom")).unwrap();
            panic!("synthesis blew up");
        });
        assert!(result.is_err());
        assert!(!registry.contains(&key("boom")));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(key("abc").to_string(), "api::page.page:abc:published");
    }
}
