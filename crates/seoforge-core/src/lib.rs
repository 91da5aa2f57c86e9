//! # seoforge-core
//!
//! Core types, traits, and pure algorithms for seoforge.
//!
//! - [`populate`]: populate-spec derivation over a cyclic schema graph
//! - [`context`]: bounded prompt context from a host entity
//! - [`merge`]: canonical SEO record from draft, existing record and defaults
//! - [`render`]: public metadata and default JSON-LD
//!
//! Nothing here performs I/O; the host, the generator and the clock are
//! reached through [`traits`].
//!
//! ## Log levels
//!
//! | Level | Used for |
//! |-------|----------|
//! | ERROR | host query or persistence failure |
//! | WARN  | generation failure, skipped entity |
//! | INFO  | record updated, sweep summary |
//! | DEBUG | populate specs, merge and context decisions, schema misses |
//! | TRACE | per-snippet text extraction, per-attribute schema walking |

pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod media;
pub mod merge;
pub mod models;
pub mod populate;
pub mod render;
pub mod schema;
pub mod text;
pub mod traits;
pub mod url;

// Re-export commonly used types at crate root
pub use config::{BackfillConfig, BasePaths, ContextConfig, GenerationConfig, SeoConfig};
pub use context::{ContentTarget, SeoContext, SeoContextBuilder, CONTENT_TARGETS};
pub use error::{Error, GenerationFailure, Result};
pub use media::MediaDescriptor;
pub use merge::{merge_seo, GenerationInfo, RawDraft, SeoPayloadMerger};
pub use models::*;
pub use populate::{clamp_depth, PopulateNode, PopulateSpec, PopulateTreeBuilder};
pub use render::{render_seo_meta, SeoMeta};
pub use schema::{AttributeDescriptor, SchemaRegistry, SchemaView};
pub use traits::*;
