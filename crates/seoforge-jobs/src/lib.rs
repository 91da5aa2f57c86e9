//! # seoforge-jobs
//!
//! Orchestration of SEO metadata synthesis.
//!
//! This crate provides:
//! - Synthesize-on-publish for host lifecycle events
//! - Backfill sweeps over entities published without a complete record
//! - At-most-one-concurrent synthesis per document and status
//! - TTL cache for the site-wide defaults
//! - Document lookup by document id, numeric id or slug
//! - An in-memory host for fixtures and tests
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use seoforge_jobs::{LifecycleEvent, MemoryHost, SeoService};
//! use seoforge_inference::OpenAIBackend;
//!
//! let config = SeoConfig::from_env();
//! let backend = OpenAIBackend::new(config.generation.clone())?;
//! let service = SeoService::new(config, Arc::new(MemoryHost::new()), Arc::new(backend), schema);
//!
//! // On publish
//! let outcome = service.handle_lifecycle(&event).await;
//!
//! // From the scheduler
//! let report = service.run_backfill().await;
//! ```

pub mod backfill;
pub mod defaults_cache;
pub mod inflight;
pub mod lifecycle;
pub mod memory_host;
pub mod resolver;
pub mod service;

// Re-export core types
pub use seoforge_core::*;

pub use backfill::{BackfillFailure, BackfillReport, BackfillTarget, BACKFILL_TARGETS};
pub use defaults_cache::{CachedValue, GlobalDefaultsCache};
pub use inflight::{InFlightGuard, InFlightRegistry, SynthesisKey};
pub use lifecycle::{
    document_id_of, is_publishing_event, status_from_event, LifecycleEvent, LifecycleParams,
};
pub use memory_host::{MemoryHost, RecordedUpdate};
pub use resolver::{classify_identifier, resolve_document};
pub use service::{SeoService, SkipReason, SynthesisOutcome};
