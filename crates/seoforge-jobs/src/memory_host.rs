//! In-memory [`ContentHost`] backed by a JSON document store.
//!
//! Used by the CLI to run against exported fixtures and by tests. The store
//! keeps a single version per document, so the requested status is recorded
//! but does not filter.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use seoforge_core::{
    ContentHost, DocumentLookup, Error, GlobalDefaults, PopulateSpec, PublicationStatus, Result,
    SeoRecord,
};

/// One `update_seo` call as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpdate {
    pub model_uid: String,
    pub document_id: String,
    pub status: PublicationStatus,
    pub seo: SeoRecord,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    documents: Mutex<HashMap<String, Vec<JsonValue>>>,
    global: Mutex<GlobalDefaults>,
    failing_global: bool,
    failing_queries: HashSet<String>,
    failing_updates: HashSet<String>,
    updates: Mutex<Vec<RecordedUpdate>>,
    lookups: Mutex<Vec<(String, DocumentLookup, PublicationStatus)>>,
    global_fetches: AtomicUsize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store of the form `{"documents": {uid: [entity, ..]}, "global": {..}}`.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("store must be a JSON object".into()))?;

        let mut host = Self::new();
        if let Some(documents) = root.get("documents").and_then(JsonValue::as_object) {
            for (uid, entries) in documents {
                let entries = entries.as_array().cloned().ok_or_else(|| {
                    Error::InvalidInput(format!("documents of {} must be an array", uid))
                })?;
                host = host.with_documents(uid.clone(), entries);
            }
        }
        if let Some(global) = root.get("global") {
            host = host.with_global(serde_json::from_value(global.clone())?);
        }
        Ok(host)
    }

    /// Serialize the store back into the shape accepted by [`Self::from_json`].
    pub fn to_json(&self) -> Result<JsonValue> {
        let documents: Map<String, JsonValue> = self
            .docs()
            .iter()
            .map(|(uid, entries)| (uid.clone(), JsonValue::Array(entries.clone())))
            .collect();
        let global = serde_json::to_value(&*self.global.lock().unwrap_or_else(|e| e.into_inner()))?;
        Ok(json!({"documents": documents, "global": global}))
    }

    pub fn with_documents(self, model_uid: impl Into<String>, entries: Vec<JsonValue>) -> Self {
        self.docs().entry(model_uid.into()).or_default().extend(entries);
        self
    }

    pub fn with_global(self, global: GlobalDefaults) -> Self {
        self.set_global(global);
        self
    }

    /// Make every `global_defaults` call fail.
    pub fn failing_global(mut self) -> Self {
        self.failing_global = true;
        self
    }

    /// Make queries against `model_uid` fail.
    pub fn failing_queries_for(mut self, model_uid: impl Into<String>) -> Self {
        self.failing_queries.insert(model_uid.into());
        self
    }

    /// Reject updates of `document_id`.
    pub fn failing_updates_for(mut self, document_id: impl Into<String>) -> Self {
        self.failing_updates.insert(document_id.into());
        self
    }

    pub fn set_global(&self, global: GlobalDefaults) {
        *self.global.lock().unwrap_or_else(|e| e.into_inner()) = global;
    }

    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn lookups(&self) -> Vec<(String, DocumentLookup, PublicationStatus)> {
        self.lookups.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn global_fetch_count(&self) -> usize {
        self.global_fetches.load(Ordering::SeqCst)
    }

    /// Current state of a stored document.
    pub fn document(&self, model_uid: &str, document_id: &str) -> Option<JsonValue> {
        self.docs()
            .get(model_uid)?
            .iter()
            .find(|entry| is_match(entry, &DocumentLookup::DocumentId(document_id.to_string())))
            .cloned()
    }

    fn docs(&self) -> MutexGuard<'_, HashMap<String, Vec<JsonValue>>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_query(&self, model_uid: &str) -> Result<()> {
        if self.failing_queries.contains(model_uid) {
            return Err(Error::Persistence(format!("query rejected for {}", model_uid)));
        }
        Ok(())
    }
}

fn is_match(entry: &JsonValue, lookup: &DocumentLookup) -> bool {
    match lookup {
        DocumentLookup::DocumentId(id) => {
            entry.get("documentId").and_then(JsonValue::as_str) == Some(id.as_str())
        }
        DocumentLookup::NumericId(id) => entry.get("id").and_then(JsonValue::as_i64) == Some(*id),
        DocumentLookup::Slug(slug) => {
            entry.get("slug").and_then(JsonValue::as_str) == Some(slug.as_str())
        }
    }
}

#[async_trait]
impl ContentHost for MemoryHost {
    async fn find_document(
        &self,
        model_uid: &str,
        lookup: &DocumentLookup,
        status: PublicationStatus,
        _populate: &PopulateSpec,
    ) -> Result<Option<JsonValue>> {
        self.lookups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((model_uid.to_string(), lookup.clone(), status));
        self.check_query(model_uid)?;

        Ok(self
            .docs()
            .get(model_uid)
            .and_then(|entries| entries.iter().find(|e| is_match(e, lookup)).cloned()))
    }

    async fn find_missing_seo(
        &self,
        model_uid: &str,
        limit: usize,
        _populate: &PopulateSpec,
    ) -> Result<Vec<JsonValue>> {
        self.check_query(model_uid)?;

        Ok(self
            .docs()
            .get(model_uid)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| SeoRecord::from_entity(e).map_or(true, |seo| seo.is_incomplete()))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_seo(
        &self,
        model_uid: &str,
        document_id: &str,
        status: PublicationStatus,
        seo: &SeoRecord,
    ) -> Result<()> {
        if self.failing_updates.contains(document_id) {
            return Err(Error::Persistence(format!(
                "update rejected for {}#{}",
                model_uid, document_id
            )));
        }

        let value = serde_json::to_value(seo)?;
        {
            let mut docs = self.docs();
            let entry = docs
                .get_mut(model_uid)
                .and_then(|entries| {
                    entries.iter_mut().find(|e| {
                        is_match(e, &DocumentLookup::DocumentId(document_id.to_string()))
                    })
                })
                .ok_or_else(|| Error::NotFound(format!("{}#{}", model_uid, document_id)))?;
            if let Some(object) = entry.as_object_mut() {
                object.insert("seo".to_string(), value);
            }
        }

        debug!(model_uid, document_id, %status, "Stored SEO record");
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedUpdate {
                model_uid: model_uid.to_string(),
                document_id: document_id.to_string(),
                status,
                seo: seo.clone(),
            });
        Ok(())
    }

    async fn global_defaults(&self) -> Result<GlobalDefaults> {
        self.global_fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing_global {
            return Err(Error::Persistence("global settings unavailable".into()));
        }
        Ok(self.global.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}
