//! Prompt-context extraction.
//!
//! [`SeoContextBuilder`] turns a host entity into a bounded [`SeoContext`]:
//! identity fields, a canonical URL candidate, and a deduplicated sample of
//! the entity's readable text. The text bound keeps the outbound generation
//! call under its token ceiling.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::config::{BasePaths, ContextConfig};
use crate::defaults;
use crate::models::{ContentKind, Tone};
use crate::text;
use crate::url::canonical_path;

/// Keys whose string values are always treated as readable text.
pub const TEXT_KEYS: &[&str] = &[
    "title",
    "heading",
    "subheading",
    "subtitle",
    "summary",
    "description",
    "body",
    "content",
    "text",
    "richtext",
    "quote",
    "copy",
    "paragraph",
    "intro",
    "details",
    "label",
    "cta",
    "question",
    "answer",
    "highlight",
];

/// Structural, media and audit keys skipped during extraction.
pub const IGNORED_KEYS: &[&str] = &[
    "id",
    "documentId",
    "__component",
    "createdAt",
    "updatedAt",
    "publishedAt",
    "createdBy",
    "updatedBy",
    "localizations",
    "seo",
    "cover",
    "gallery",
    "heroImage",
    "image",
    "images",
    "media",
    "files",
];

/// Strings longer than this with no whitespace near the start are treated
/// as encoded blobs.
const BLOB_MIN_LENGTH: usize = 1200;
const BLOB_PROBE: usize = 80;

// =============================================================================
// CONTENT TARGETS
// =============================================================================

/// A host model that receives generated metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTarget {
    pub model_uid: &'static str,
    pub kind: ContentKind,
    /// Human label used in the prompt.
    pub label: &'static str,
}

/// Models handled by lifecycle synthesis and backfill.
pub const CONTENT_TARGETS: &[ContentTarget] = &[
    ContentTarget {
        model_uid: "api::page.page",
        kind: ContentKind::Page,
        label: "page",
    },
    ContentTarget {
        model_uid: "api::article.article",
        kind: ContentKind::Article,
        label: "blog article",
    },
    ContentTarget {
        model_uid: "api::event.event",
        kind: ContentKind::Event,
        label: "event",
    },
];

impl ContentTarget {
    pub fn lookup(model_uid: &str) -> Option<&'static ContentTarget> {
        CONTENT_TARGETS.iter().find(|t| t.model_uid == model_uid)
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Per-attempt synthesis context. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoContext {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub label: String,
    pub title: String,
    pub subtitle: String,
    pub summary: String,
    pub slug: String,
    pub canonical_url: Option<String>,
    pub publication_date: Option<String>,
    pub updated_at: String,
    pub audience: String,
    pub tone: Tone,
    /// Bounded readable text.
    pub content: String,
    /// Site origin the canonical URL was built from.
    #[serde(skip)]
    pub site_url: Option<String>,
    /// Prompt sent to the generator, once built.
    #[serde(skip)]
    pub prompt: Option<String>,
}

impl SeoContext {
    /// Empty context for `kind`, used where no entity text is available.
    pub fn empty(kind: ContentKind, site_url: Option<String>) -> Self {
        Self {
            kind,
            label: kind.as_str().to_string(),
            title: String::new(),
            subtitle: String::new(),
            summary: String::new(),
            slug: String::new(),
            canonical_url: None,
            publication_date: None,
            updated_at: String::new(),
            audience: defaults::AUDIENCE.to_string(),
            tone: Tone::Informational,
            content: String::new(),
            site_url,
            prompt: None,
        }
    }
}

/// Builds [`SeoContext`] values from host entities.
#[derive(Debug, Clone, Default)]
pub struct SeoContextBuilder {
    config: ContextConfig,
    base_paths: BasePaths,
}

impl SeoContextBuilder {
    pub fn new(config: ContextConfig, base_paths: BasePaths) -> Self {
        Self { config, base_paths }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Canonical path of `entity` for `kind`.
    pub fn canonical_path(&self, entity: &JsonValue, kind: ContentKind) -> String {
        canonical_path(
            self.base_paths.for_kind(kind),
            &slug_of(entity),
            kind == ContentKind::Page,
        )
    }

    /// Build a context using the current time as the `updatedAt` fallback.
    pub fn build_context(
        &self,
        entity: &JsonValue,
        kind: ContentKind,
        label: &str,
        site_url: Option<&str>,
    ) -> SeoContext {
        self.build_context_at(entity, kind, label, site_url, Utc::now())
    }

    pub fn build_context_at(
        &self,
        entity: &JsonValue,
        kind: ContentKind,
        label: &str,
        site_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> SeoContext {
        let site_url = site_url.map(str::trim).filter(|s| !s.is_empty());
        let slug = slug_of(entity);
        let path = canonical_path(self.base_paths.for_kind(kind), &slug, kind == ContentKind::Page);
        let canonical_url = site_url.map(|site| format!("{}{}", site, path));

        let field = |key: &str| text::as_text(entity.get(key));
        let summary = ["summary", "subtitle", "description", "excerpt"]
            .iter()
            .find_map(|key| field(key))
            .unwrap_or_default();
        let updated_at = field("updatedAt")
            .or_else(|| field("publishedAt"))
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

        let content = self.collect_readable_text(entity);
        debug!(
            kind = %kind,
            slug = %slug,
            content_chars = content.chars().count(),
            "Built SEO context"
        );

        SeoContext {
            kind,
            label: label.to_string(),
            title: field("title").unwrap_or_default(),
            subtitle: field("subtitle").unwrap_or_default(),
            summary,
            slug,
            canonical_url,
            publication_date: publication_date(entity, kind),
            updated_at,
            audience: field("audience").unwrap_or_else(|| self.config.default_audience.clone()),
            tone: self.resolve_tone(entity),
            content,
            site_url: site_url.map(str::to_string),
            prompt: None,
        }
    }

    /// Entity-declared tone if valid, else the configured default.
    pub fn resolve_tone(&self, entity: &JsonValue) -> Tone {
        let declared = entity
            .pointer("/seo/aiAssistant/toneOfVoice")
            .and_then(JsonValue::as_str)
            .and_then(Tone::parse_loose)
            .or_else(|| {
                entity
                    .get("toneOfVoice")
                    .and_then(JsonValue::as_str)
                    .and_then(Tone::parse_loose)
            });
        declared.unwrap_or(self.config.default_tone)
    }

    /// Depth-first, deduplicated readable text, bounded by the configured
    /// snippet count and character budget.
    pub fn collect_readable_text(&self, entity: &JsonValue) -> String {
        let mut collector = TextCollector {
            snippets: Vec::new(),
            total: 0,
            max_snippets: self.config.max_snippets,
            max_length: self.config.max_text_length,
        };
        collector.walk(entity, None);
        let joined = collector.snippets.join("\n");
        joined.chars().take(self.config.max_text_length).collect()
    }
}

struct TextCollector {
    snippets: Vec<String>,
    /// Length of the newline-joined snippets, in characters.
    total: usize,
    max_snippets: usize,
    max_length: usize,
}

impl TextCollector {
    fn exhausted(&self) -> bool {
        self.total >= self.max_length
    }

    fn push(&mut self, value: &str) {
        if self.snippets.len() >= self.max_snippets {
            return;
        }
        let normalized = text::collapse_whitespace(value);
        let len = normalized.chars().count();
        if len < defaults::CONTEXT_MIN_SNIPPET {
            return;
        }
        if len > BLOB_MIN_LENGTH
            && !normalized
                .chars()
                .take(BLOB_PROBE)
                .any(char::is_whitespace)
        {
            return;
        }
        if self
            .snippets
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&normalized))
        {
            return;
        }
        trace!(chars = len, "Collected snippet");
        if !self.snippets.is_empty() {
            self.total += 1;
        }
        self.total += len;
        self.snippets.push(normalized);
    }

    fn walk(&mut self, value: &JsonValue, key_hint: Option<&str>) {
        if self.exhausted() {
            return;
        }
        match value {
            JsonValue::String(s) => {
                let hinted = key_hint.map_or(true, |key| TEXT_KEYS.contains(&key));
                if hinted || s.chars().count() <= defaults::CONTEXT_SHORT_STRING {
                    self.push(s);
                }
            }
            JsonValue::Array(items) => {
                for item in items {
                    self.walk(item, key_hint);
                }
            }
            JsonValue::Object(map) => {
                for (key, nested) in map {
                    if IGNORED_KEYS.contains(&key.as_str()) {
                        continue;
                    }
                    match nested {
                        JsonValue::String(s) if TEXT_KEYS.contains(&key.as_str()) => self.push(s),
                        _ => self.walk(nested, Some(key)),
                    }
                }
            }
            _ => {}
        }
    }
}

fn slug_of(entity: &JsonValue) -> String {
    text::as_text(entity.get("slug"))
        .or_else(|| text::as_text(entity.get("id")))
        .unwrap_or_default()
}

/// Publication date by kind: events prefer `startDate`, articles prefer
/// `publicationDate`, then `publishedAt`, `updatedAt`, `createdAt`.
pub fn publication_date(entity: &JsonValue, kind: ContentKind) -> Option<String> {
    let preferred = match kind {
        ContentKind::Event => Some("startDate"),
        ContentKind::Article | ContentKind::News => Some("publicationDate"),
        ContentKind::Page => None,
    };
    preferred
        .into_iter()
        .chain(["publishedAt", "updatedAt", "createdAt"])
        .find_map(|key| text::as_text(entity.get(key)))
}
