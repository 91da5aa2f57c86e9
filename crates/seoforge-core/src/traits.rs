//! Core traits for seoforge abstractions.
//!
//! These traits define the seams to the outside world: the text-generation
//! capability, the CMS host that stores entities, and the clock. Concrete
//! implementations live in the inference and jobs crates or in tests.

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{GenerationFailure, Result};
use crate::models::{GlobalDefaults, SeoRecord};
use crate::populate::PopulateSpec;

// =============================================================================
// GENERATION
// =============================================================================

/// External text-generation capability.
///
/// Implementations fail fast and never retry; retries belong to whoever
/// schedules the call.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text with system context.
    async fn generate_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> std::result::Result<String, GenerationFailure>;

    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationFailure> {
        self.generate_with_system("", prompt).await
    }

    /// Get the model name being used.
    fn model_name(&self) -> &str;

    /// Provider label recorded with generated metadata.
    fn provider_name(&self) -> &str;
}

// =============================================================================
// HOST
// =============================================================================

/// Draft/publish state of a host document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Published,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PublicationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(format!("Invalid publication status: {}", other)),
        }
    }
}

/// How a single document is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentLookup {
    /// Opaque host document id.
    DocumentId(String),
    /// Legacy numeric row id.
    NumericId(i64),
    Slug(String),
}

impl fmt::Display for DocumentLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentId(id) => write!(f, "documentId={}", id),
            Self::NumericId(id) => write!(f, "id={}", id),
            Self::Slug(slug) => write!(f, "slug={}", slug),
        }
    }
}

/// The CMS host: entity lookup and persistence.
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Fetch one document, populated per `populate`.
    async fn find_document(
        &self,
        model_uid: &str,
        lookup: &DocumentLookup,
        status: PublicationStatus,
        populate: &PopulateSpec,
    ) -> Result<Option<JsonValue>>;

    /// Up to `limit` documents whose SEO record is missing or lacks a title
    /// or description.
    async fn find_missing_seo(
        &self,
        model_uid: &str,
        limit: usize,
        populate: &PopulateSpec,
    ) -> Result<Vec<JsonValue>>;

    /// Replace a document's SEO record.
    async fn update_seo(
        &self,
        model_uid: &str,
        document_id: &str,
        status: PublicationStatus,
        seo: &SeoRecord,
    ) -> Result<()>;

    /// Load the site-wide settings singleton.
    async fn global_defaults(&self) -> Result<GlobalDefaults>;
}

// =============================================================================
// CLOCK
// =============================================================================

/// Time source, injected for testability.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
