//! Centralized default constants for seoforge.
//!
//! **This module is the single source of truth** for shared default values.
//! Organized by domain area.

// =============================================================================
// POPULATE
// =============================================================================

/// Default nesting depth for populate specs.
pub const POPULATE_DEPTH: i32 = 4;

/// Lower bound for a caller-supplied populate depth.
pub const POPULATE_DEPTH_MIN: i32 = 1;

/// Upper bound for a caller-supplied populate depth.
pub const POPULATE_DEPTH_MAX: i32 = 8;

// =============================================================================
// FIELD LIMITS
// =============================================================================

/// Maximum characters in a meta title.
pub const META_TITLE_MAX: usize = 70;

/// Maximum characters in a meta description.
pub const META_DESCRIPTION_MAX: usize = 165;

/// Maximum characters in the comma-joined keyword list.
pub const META_KEYWORDS_MAX: usize = 255;

/// Maximum characters in an Open Graph title.
pub const OG_TITLE_MAX: usize = 70;

/// Maximum characters in an Open Graph or social description.
pub const OG_DESCRIPTION_MAX: usize = 200;

/// Maximum characters in a share image alt text.
pub const SHARE_IMAGE_ALT_MAX: usize = 120;

/// Maximum characters in a twitter creator handle.
pub const TWITTER_CREATOR_MAX: usize = 80;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Confidence assumed when the draft carries no usable score.
pub const CONFIDENCE_BASELINE: f64 = 0.85;

// =============================================================================
// RECORD DEFAULTS
// =============================================================================

/// Placeholder title when no source provides one.
pub const TITLE_PLACEHOLDER: &str = "Untitled page";

/// Default viewport meta value.
pub const META_VIEWPORT: &str = "width=device-width, initial-scale=1";

/// Default content language (BCP-47).
pub const LOCALE: &str = "de-DE";

/// Default Open Graph locale.
pub const OG_LOCALE: &str = "de_DE";

/// Networks accepted for per-network social overrides.
pub const SOCIAL_NETWORKS: [&str; 3] = ["facebook", "linkedin", "twitter"];

/// Slugs that address the home page.
pub const HOME_SLUGS: [&str; 4] = ["home", "index", "start", "startseite"];

// =============================================================================
// CONTEXT EXTRACTION
// =============================================================================

/// Maximum characters of readable text sent to the generator.
pub const CONTEXT_MAX_TEXT_LENGTH: usize = 4000;

/// Maximum number of text snippets collected from an entity.
pub const CONTEXT_MAX_SNIPPETS: usize = 60;

/// Strings at most this long are collected even without a textual key hint.
pub const CONTEXT_SHORT_STRING: usize = 320;

/// Snippets shorter than this are dropped.
pub const CONTEXT_MIN_SNIPPET: usize = 3;

/// Default audience description.
pub const AUDIENCE: &str = "general website visitors";

// =============================================================================
// GENERATION
// =============================================================================

/// Default chat completions endpoint.
pub const GENERATION_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default generation model.
pub const GENERATION_MODEL: &str = "gpt-4o-mini";

/// Default provider label stored on generated records.
pub const GENERATION_PROVIDER: &str = "openai";

/// Default sampling temperature.
pub const GENERATION_TEMPERATURE: f32 = 0.4;

/// Maximum tokens requested per generation.
pub const GENERATION_MAX_TOKENS: u32 = 600;

/// Generation request timeout in milliseconds.
pub const GENERATION_TIMEOUT_MS: u64 = 20_000;

// =============================================================================
// HOST / CACHE / BACKFILL
// =============================================================================

/// Backend origin used when nothing is configured.
pub const BACKEND_URL: &str = "http://localhost:1337";

/// Global defaults cache TTL in milliseconds (5 minutes).
pub const GLOBAL_CACHE_TTL_MS: u64 = 5 * 60 * 1000;

/// Entities processed per content type per backfill run.
pub const BACKFILL_BATCH: usize = 3;

/// Backfill schedule expression.
pub const BACKFILL_SCHEDULE: &str = "*/5 * * * *";

/// Timezone for the backfill schedule.
pub const BACKFILL_TIMEZONE: &str = "Europe/Berlin";
