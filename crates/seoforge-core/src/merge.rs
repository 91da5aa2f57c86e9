//! Field-by-field merge of an AI draft, the persisted record and site
//! defaults into a canonical [`SeoRecord`].
//!
//! # Precedence
//!
//! Fields resolve **draft → existing → global default → context →
//! hard-coded default**, with one exception: `metaTitle`/`metaDescription`
//! consult the entity (context title and summary) before the global
//! default, since global defaults describe the site rather than the entity.
//! The content kind supplies `contentType`/`schemaType`/`ogType` and the
//! sitemap hints when no other source has them.
//!
//! Out-of-domain enum values, invalid URLs and malformed JSON from the
//! draft are dropped silently and the next source is used. The merge never
//! fails.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::context::SeoContext;
use crate::defaults;
use crate::models::{
    parse_enum, parse_json_object, AiAssistant, GlobalDefaults, MetaRobots, MetaSocialEntry,
    SeoRecord, Tone, TwitterCard,
};
use crate::text;
use crate::url::normalize_absolute_url;

// =============================================================================
// DRAFT
// =============================================================================

/// Unvalidated metadata proposal from a generation call.
///
/// Accepts either a flat object or `{"seo": {..}, "ai": {..}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDraft {
    seo: Map<String, JsonValue>,
    ai: Map<String, JsonValue>,
}

impl RawDraft {
    pub fn from_value(value: JsonValue) -> Self {
        let JsonValue::Object(mut root) = value else {
            return Self::default();
        };
        let ai = match root.remove("ai") {
            Some(JsonValue::Object(ai)) => ai,
            _ => Map::new(),
        };
        let seo = match root.remove("seo") {
            Some(JsonValue::Object(seo)) => seo,
            _ => root,
        };
        Self { seo, ai }
    }

    pub fn is_empty(&self) -> bool {
        self.seo.is_empty() && self.ai.is_empty()
    }

    /// Metadata field of the draft.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.seo.get(key).filter(|v| !v.is_null())
    }

    /// Insight field, read from the metadata part first, then the `ai` part.
    pub fn insight(&self, key: &str) -> Option<&JsonValue> {
        self.get(key)
            .or_else(|| self.ai.get(key).filter(|v| !v.is_null()))
    }

    fn text(&self, key: &str) -> Option<String> {
        text::as_text(self.get(key))
    }

    fn insight_text(&self, key: &str) -> Option<String> {
        text::as_text(self.insight(key))
    }

    fn sitemap_field(&self, key: &str, nested: &str) -> Option<&JsonValue> {
        self.get(key)
            .or_else(|| self.get("sitemap").and_then(|s| s.get(nested)))
    }
}

/// Provenance of a fresh generation. Echo fields in `aiAssistant` are only
/// rewritten when this is present.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInfo {
    pub provider: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

// =============================================================================
// MERGER
// =============================================================================

/// Pure, reentrant merger.
#[derive(Debug, Clone)]
pub struct SeoPayloadMerger {
    locale: String,
    generation: Option<GenerationInfo>,
}

impl Default for SeoPayloadMerger {
    fn default() -> Self {
        Self::new(defaults::LOCALE)
    }
}

impl SeoPayloadMerger {
    /// `locale` is the last-resort `metaLanguage`.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            generation: None,
        }
    }

    /// Mark the merge as the result of a fresh generation.
    pub fn with_generation(mut self, info: GenerationInfo) -> Self {
        self.generation = Some(info);
        self
    }

    pub fn merge(
        &self,
        draft: &RawDraft,
        existing: Option<&SeoRecord>,
        global: &GlobalDefaults,
        ctx: &SeoContext,
    ) -> SeoRecord {
        let empty = SeoRecord::default();
        let existing = existing.unwrap_or(&empty);
        let fallback = &global.default_seo;
        let site_url = ctx.site_url.as_deref();
        let kind = ctx.kind;

        let meta_title = first_text([
            draft.text("metaTitle"),
            nonblank(&existing.meta_title),
            nonblank(&ctx.title),
            nonblank(&fallback.meta_title),
            global.site_name.clone(),
        ])
        .and_then(|t| text::truncate(&t, defaults::META_TITLE_MAX))
        .unwrap_or_else(|| defaults::TITLE_PLACEHOLDER.to_string());

        let meta_description = first_text([
            draft.text("metaDescription"),
            nonblank(&existing.meta_description),
            nonblank(&ctx.summary),
            nonblank(&fallback.meta_description),
            global.site_description.clone(),
        ])
        .and_then(|d| text::truncate(&d, defaults::META_DESCRIPTION_MAX))
        .unwrap_or_default();

        let draft_keywords = ["metaKeywords", "secondaryKeywords", "primaryKeyword"]
            .iter()
            .map(|key| text::keyword_list(draft.get(key)))
            .find(|list| !list.is_empty())
            .unwrap_or_default();
        let meta_keywords = text::format_keywords(&draft_keywords)
            .or_else(|| opt_text(&existing.meta_keywords))
            .or_else(|| opt_text(&fallback.meta_keywords));

        let focus_keyword = first_text([
            draft.text("focusKeyword"),
            draft.text("primaryKeyword"),
            opt_text(&existing.focus_keyword),
            opt_text(&fallback.focus_keyword),
            nonblank(&ctx.title),
        ]);

        let canonical_url = [
            draft.text("canonicalUrl"),
            opt_text(&existing.canonical_url),
            ctx.canonical_url.clone(),
        ]
        .into_iter()
        .flatten()
        .find_map(|candidate| normalize_absolute_url(&candidate, site_url));

        let meta_robots = parse_enum(draft.get("metaRobots"))
            .or(existing.meta_robots)
            .or(fallback.meta_robots)
            .unwrap_or(MetaRobots::IndexFollow);

        let meta_language = first_text([
            draft.text("metaLanguage"),
            opt_text(&existing.meta_language),
            opt_text(&fallback.meta_language),
        ])
        .unwrap_or_else(|| self.locale.clone());

        let meta_viewport = first_text([
            draft.text("metaViewport"),
            opt_text(&existing.meta_viewport),
            opt_text(&fallback.meta_viewport),
        ])
        .unwrap_or_else(|| defaults::META_VIEWPORT.to_string());

        let sitemap_priority = text::as_number(draft.sitemap_field("sitemapPriority", "priority"))
            .or(existing.sitemap_priority)
            .or(fallback.sitemap_priority)
            .unwrap_or_else(|| kind.sitemap_priority())
            .clamp(0.0, 1.0);

        let sitemap_change_freq = parse_enum(draft.sitemap_field("sitemapChangeFreq", "changeFrequency"))
            .or(existing.sitemap_change_freq)
            .or(fallback.sitemap_change_freq)
            .unwrap_or_else(|| kind.sitemap_change_freq());

        let content_type = parse_enum(draft.get("contentType"))
            .or(existing.content_type)
            .or(fallback.content_type)
            .unwrap_or_else(|| kind.content_type());
        let schema_type = parse_enum(draft.get("schemaType"))
            .or(existing.schema_type)
            .or(fallback.schema_type)
            .unwrap_or_else(|| kind.schema_type());
        let og_type = parse_enum(draft.get("ogType"))
            .or(existing.og_type)
            .or(fallback.og_type)
            .unwrap_or_else(|| kind.og_type());

        let structured_data = draft
            .get("structuredData")
            .and_then(parse_json_object)
            .or_else(|| existing.structured_data.clone());
        let extra_meta = draft
            .get("extraMeta")
            .and_then(parse_json_object)
            .or_else(|| existing.extra_meta.clone());

        let share_image_alt = first_text([
            draft.text("shareImageAlt"),
            opt_text(&existing.share_image_alt),
        ])
        .and_then(|alt| text::truncate(&alt, defaults::SHARE_IMAGE_ALT_MAX));

        let og_title = first_text([
            draft.text("ogTitle"),
            opt_text(&existing.og_title),
            Some(meta_title.clone()),
        ])
        .and_then(|t| text::truncate(&t, defaults::OG_TITLE_MAX));

        let og_description = first_text([
            draft.text("ogDescription"),
            opt_text(&existing.og_description),
            nonblank(&meta_description),
        ])
        .and_then(|d| text::truncate(&d, defaults::OG_DESCRIPTION_MAX));

        let og_locale = first_text([
            draft.text("ogLocale"),
            opt_text(&existing.og_locale),
            opt_text(&fallback.og_locale),
        ])
        .unwrap_or_else(|| meta_language.replace('-', "_"));

        let og_url = [draft.text("ogUrl"), opt_text(&existing.og_url)]
            .into_iter()
            .flatten()
            .find_map(|candidate| normalize_absolute_url(&candidate, site_url))
            .or_else(|| canonical_url.clone());

        let og_published_time =
            opt_text(&existing.og_published_time).or_else(|| ctx.publication_date.clone());
        let context_updated = nonblank(&ctx.updated_at);
        let og_modified_time = if self.generation.is_some() {
            context_updated.or_else(|| opt_text(&existing.og_modified_time))
        } else {
            opt_text(&existing.og_modified_time).or(context_updated)
        };

        let twitter_card = parse_enum(draft.get("twitterCard"))
            .or(existing.twitter_card)
            .or(fallback.twitter_card)
            .unwrap_or(TwitterCard::SummaryLargeImage);

        let twitter_creator = first_text([
            draft.insight_text("twitterCreator"),
            opt_text(&existing.twitter_creator),
            opt_text(&fallback.twitter_creator),
        ])
        .and_then(|c| text::truncate(&c, defaults::TWITTER_CREATOR_MAX));

        let social_title = og_title.clone().unwrap_or_else(|| meta_title.clone());
        let social_url = canonical_url.clone().or_else(|| site_url.map(str::to_string));
        let mut social_updates = build_social_entries(
            draft.get("metaSocial"),
            &social_title,
            og_description.as_deref(),
            social_url.as_deref(),
            site_url,
        );
        if social_updates.is_empty() && existing.meta_social.is_empty() {
            social_updates = seed_social_entries(
                &social_title,
                og_description.as_deref(),
                social_url.as_deref(),
                site_url,
            );
        }
        let meta_social = merge_meta_social(&existing.meta_social, social_updates);

        let ai_assistant = self.merge_assistant(
            draft,
            existing.ai_assistant.as_ref(),
            ctx,
            &meta_title,
            &meta_description,
            meta_keywords.as_deref(),
            focus_keyword.as_deref(),
        );

        debug!(
            kind = %kind,
            draft_fields = draft.seo.len(),
            has_existing = !existing.meta_title.is_empty(),
            generated = self.generation.is_some(),
            "Merged SEO record"
        );

        SeoRecord {
            meta_title,
            meta_description,
            meta_keywords,
            focus_keyword,
            canonical_url,
            meta_robots: Some(meta_robots),
            meta_language: Some(meta_language),
            meta_viewport: Some(meta_viewport),
            sitemap_priority: Some(sitemap_priority),
            sitemap_change_freq: Some(sitemap_change_freq),
            content_type: Some(content_type),
            schema_type: Some(schema_type),
            structured_data,
            share_image: existing.share_image.clone(),
            share_image_alt,
            og_title,
            og_description,
            og_type: Some(og_type),
            og_locale: Some(og_locale),
            og_url,
            og_published_time,
            og_modified_time,
            twitter_card: Some(twitter_card),
            twitter_creator,
            meta_social,
            extra_meta,
            ai_assistant: Some(ai_assistant),
            other: existing.other.clone(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_assistant(
        &self,
        draft: &RawDraft,
        existing: Option<&AiAssistant>,
        ctx: &SeoContext,
        meta_title: &str,
        meta_description: &str,
        meta_keywords: Option<&str>,
        focus_keyword: Option<&str>,
    ) -> AiAssistant {
        let mut assistant = existing.cloned().unwrap_or_default();

        let secondary = text::unique_strings(text::keyword_list(draft.insight("secondaryKeywords")));
        if !secondary.is_empty() {
            assistant.secondary_keywords = secondary;
        }

        assistant.target_audience = draft
            .insight_text("targetAudience")
            .or_else(|| opt_text(&assistant.target_audience))
            .or_else(|| nonblank(&ctx.audience));

        assistant.tone_of_voice = draft
            .insight("toneOfVoice")
            .and_then(JsonValue::as_str)
            .and_then(Tone::parse_loose)
            .or(assistant.tone_of_voice)
            .or(Some(ctx.tone));

        assistant.primary_keyword = draft
            .text("primaryKeyword")
            .or_else(|| draft.text("focusKeyword"))
            .or_else(|| opt_text(&assistant.primary_keyword))
            .or_else(|| focus_keyword.map(str::to_string));

        assistant.call_to_action = draft
            .insight_text("callToAction")
            .or_else(|| opt_text(&assistant.call_to_action));

        let Some(info) = &self.generation else {
            return assistant;
        };

        assistant.prompt = ctx.prompt.clone().or(assistant.prompt);
        assistant.generated_title = Some(meta_title.to_string());
        assistant.generated_description = nonblank(meta_description);
        assistant.generated_keywords = if assistant.secondary_keywords.is_empty() {
            meta_keywords.map(text::split_keywords).unwrap_or_default()
        } else {
            assistant.secondary_keywords.clone()
        };
        assistant.provider = Some(info.provider.clone());
        assistant.model = Some(info.model.clone());
        assistant.last_generated_at =
            Some(info.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true));
        assistant.confidence_score = Some(extract_confidence(
            draft
                .get("confidence")
                .or_else(|| draft.insight("confidenceScore")),
        ));
        assistant
    }
}

/// Convenience wrapper around [`SeoPayloadMerger::merge`] with default
/// settings and no generation provenance.
pub fn merge_seo(
    draft: &RawDraft,
    existing: Option<&SeoRecord>,
    global: &GlobalDefaults,
    ctx: &SeoContext,
) -> SeoRecord {
    SeoPayloadMerger::default().merge(draft, existing, global, ctx)
}

/// Clamp a numeric score into `[0, 1]`; anything else is the baseline.
pub fn extract_confidence(value: Option<&JsonValue>) -> f64 {
    text::as_number(value)
        .map(|n| n.clamp(0.0, 1.0))
        .unwrap_or(defaults::CONFIDENCE_BASELINE)
}

// =============================================================================
// META SOCIAL
// =============================================================================

/// Per-network entries from a draft's `metaSocial`, given as a list of
/// entries or a map keyed by network. Unknown networks are dropped.
fn build_social_entries(
    input: Option<&JsonValue>,
    fallback_title: &str,
    fallback_description: Option<&str>,
    fallback_url: Option<&str>,
    site_url: Option<&str>,
) -> Vec<MetaSocialEntry> {
    let rows: Vec<(String, &JsonValue)> = match input {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|row| {
                let network = text::as_text(row.get("socialNetwork"))
                    .or_else(|| text::as_text(row.get("network")))?;
                Some((network, row))
            })
            .collect(),
        Some(JsonValue::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        _ => Vec::new(),
    };

    rows.into_iter()
        .filter(|(network, _)| defaults::SOCIAL_NETWORKS.contains(&network.as_str()))
        .map(|(network, row)| {
            social_entry(
                network,
                text::as_text(row.get("title")).as_deref().unwrap_or(fallback_title),
                text::as_text(row.get("description"))
                    .as_deref()
                    .or(fallback_description),
                text::as_text(row.get("url")).as_deref().or(fallback_url),
                site_url,
            )
        })
        .collect()
}

fn seed_social_entries(
    title: &str,
    description: Option<&str>,
    url: Option<&str>,
    site_url: Option<&str>,
) -> Vec<MetaSocialEntry> {
    defaults::SOCIAL_NETWORKS
        .iter()
        .map(|network| social_entry(network.to_string(), title, description, url, site_url))
        .collect()
}

fn social_entry(
    network: String,
    title: &str,
    description: Option<&str>,
    url: Option<&str>,
    site_url: Option<&str>,
) -> MetaSocialEntry {
    MetaSocialEntry {
        social_network: Some(network),
        title: text::truncate(title, defaults::OG_TITLE_MAX),
        description: description.and_then(|d| text::truncate(d, defaults::OG_DESCRIPTION_MAX)),
        url: url.and_then(|u| normalize_absolute_url(u, site_url)),
        ..Default::default()
    }
}

/// Keyed union of existing entries and updates.
///
/// Existing entries keep their order; entries sharing a network collapse
/// into one. Updates overwrite textual fields only and never touch
/// `image`/`imageAlt`.
pub fn merge_meta_social(
    existing: &[MetaSocialEntry],
    updates: Vec<MetaSocialEntry>,
) -> Vec<MetaSocialEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, MetaSocialEntry> = HashMap::new();

    for (idx, entry) in existing.iter().enumerate() {
        let key = entry
            .social_network
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("existing-{}", idx));
        match entries.get_mut(&key) {
            Some(previous) => {
                let image = previous.image.take();
                let image_alt = previous.image_alt.take();
                *previous = entry.clone();
                previous.image = previous.image.take().or(image);
                previous.image_alt = previous.image_alt.take().or(image_alt);
            }
            None => {
                order.push(key.clone());
                entries.insert(key, entry.clone());
            }
        }
    }

    for update in updates {
        let Some(key) = update.social_network.clone() else {
            continue;
        };
        match entries.get_mut(&key) {
            Some(previous) => {
                if update.title.is_some() {
                    previous.title = update.title;
                }
                if update.description.is_some() {
                    previous.description = update.description;
                }
                if update.url.is_some() {
                    previous.url = update.url;
                }
            }
            None => {
                order.push(key.clone());
                entries.insert(
                    key,
                    MetaSocialEntry {
                        image: None,
                        image_alt: None,
                        ..update
                    },
                );
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| entries.remove(&key))
        .collect()
}

// =============================================================================
// HELPERS
// =============================================================================

fn nonblank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn opt_text(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(nonblank)
}

fn first_text<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|c| !c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeFrequency, ContentKind, ContentType, OgType, SchemaType};
    use chrono::TimeZone;
    use serde_json::json;

    fn ctx(kind: ContentKind) -> SeoContext {
        let mut ctx = SeoContext::empty(kind, Some("https://example.com".to_string()));
        ctx.title = "Grand Opening".to_string();
        ctx.canonical_url = Some("https://example.com/events/grand-opening".to_string());
        ctx.updated_at = "2025-05-01T00:00:00.000Z".to_string();
        ctx
    }

    fn generation() -> GenerationInfo {
        GenerationInfo {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            generated_at: Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap(),
        }
    }

    fn draft(value: JsonValue) -> RawDraft {
        RawDraft::from_value(value)
    }

    #[test]
    fn test_raw_draft_shapes() {
        let flat = draft(json!({"metaTitle": "A", "callToAction": "Go"}));
        assert_eq!(flat.text("metaTitle").as_deref(), Some("A"));
        assert_eq!(flat.insight_text("callToAction").as_deref(), Some("Go"));

        let nested = draft(json!({"seo": {"metaTitle": "B"}, "ai": {"callToAction": "Join"}}));
        assert_eq!(nested.text("metaTitle").as_deref(), Some("B"));
        assert_eq!(nested.text("callToAction"), None);
        assert_eq!(nested.insight_text("callToAction").as_deref(), Some("Join"));

        assert!(draft(json!("not an object")).is_empty());
        assert!(draft(json!(null)).is_empty());
    }

    #[test]
    fn test_empty_sources_degrade_to_defaults() {
        let mut context = ctx(ContentKind::Page);
        context.title.clear();
        let record = merge_seo(&RawDraft::default(), None, &GlobalDefaults::default(), &context);
        assert_eq!(record.meta_title, "Untitled page");
        assert_eq!(record.meta_description, "");
        assert_eq!(record.meta_robots, Some(MetaRobots::IndexFollow));
        assert_eq!(record.twitter_card, Some(TwitterCard::SummaryLargeImage));
        assert_eq!(record.meta_language.as_deref(), Some("de-DE"));
        assert_eq!(record.og_locale.as_deref(), Some("de_DE"));
        assert_eq!(record.content_type, Some(ContentType::Webpage));
        assert_eq!(record.schema_type, Some(SchemaType::WebPage));
        assert_eq!(record.og_type, Some(OgType::Website));
        assert_eq!(record.sitemap_priority, Some(0.8));
    }

    #[test]
    fn test_global_site_name_used_before_placeholder() {
        let mut context = ctx(ContentKind::Page);
        context.title.clear();
        let global = GlobalDefaults {
            site_name: Some("Kulturhaus".into()),
            site_description: Some("Events and more".into()),
            ..Default::default()
        };
        let record = merge_seo(&RawDraft::default(), None, &global, &context);
        assert_eq!(record.meta_title, "Kulturhaus");
        assert_eq!(record.meta_description, "Events and more");
    }

    #[test]
    fn test_entity_title_before_global_default_title() {
        let global = GlobalDefaults {
            site_name: Some("Kulturhaus".into()),
            default_seo: SeoRecord {
                meta_title: "Kulturhaus events".into(),
                meta_description: "Everything on stage this season".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut context = ctx(ContentKind::Event);
        context.summary = "Doors open at seven".to_string();
        let record = merge_seo(&RawDraft::default(), None, &global, &context);
        assert_eq!(record.meta_title, "Grand Opening");
        assert_eq!(record.meta_description, "Doors open at seven");

        context.title.clear();
        context.summary.clear();
        let record = merge_seo(&RawDraft::default(), None, &global, &context);
        assert_eq!(record.meta_title, "Kulturhaus events");
        assert_eq!(record.meta_description, "Everything on stage this season");
    }

    #[test]
    fn test_draft_wins_and_is_truncated() {
        let long_title = "An extraordinarily long title that keeps going well beyond the limit of seventy";
        let record = merge_seo(
            &draft(json!({"metaTitle": long_title, "metaDescription": "Short."})),
            None,
            &GlobalDefaults::default(),
            &ctx(ContentKind::Event),
        );
        assert!(record.meta_title.chars().count() <= 70);
        assert!(record.meta_title.ends_with("..."));
        assert_eq!(record.meta_description, "Short.");
        assert_eq!(record.og_title.as_deref(), Some(record.meta_title.as_str()));
    }

    #[test]
    fn test_invalid_enums_fall_through() {
        let existing = SeoRecord {
            meta_title: "Stored".into(),
            meta_robots: Some(MetaRobots::NoindexFollow),
            ..Default::default()
        };
        let record = merge_seo(
            &draft(json!({
                "metaRobots": "garbage",
                "schemaType": "webpage",
                "ogType": 4,
                "twitterCard": "summary"
            })),
            Some(&existing),
            &GlobalDefaults::default(),
            &ctx(ContentKind::Event),
        );
        assert_eq!(record.meta_robots, Some(MetaRobots::NoindexFollow));
        assert_eq!(record.schema_type, Some(SchemaType::Event));
        assert_eq!(record.og_type, Some(OgType::Event));
        assert_eq!(record.twitter_card, Some(TwitterCard::Summary));

        let record = merge_seo(
            &draft(json!({"metaRobots": "garbage"})),
            None,
            &GlobalDefaults::default(),
            &ctx(ContentKind::Event),
        );
        assert_eq!(record.meta_robots, Some(MetaRobots::IndexFollow));
    }

    #[test]
    fn test_global_enum_used_when_no_draft_or_existing() {
        let global = GlobalDefaults {
            default_seo: SeoRecord {
                meta_robots: Some(MetaRobots::NoindexNofollow),
                sitemap_change_freq: Some(ChangeFrequency::Monthly),
                ..Default::default()
            },
            ..Default::default()
        };
        let record = merge_seo(&RawDraft::default(), None, &global, &ctx(ContentKind::Page));
        assert_eq!(record.meta_robots, Some(MetaRobots::NoindexNofollow));
        assert_eq!(record.sitemap_change_freq, Some(ChangeFrequency::Monthly));
    }

    #[test]
    fn test_global_type_fields_used_before_kind_defaults() {
        let global = GlobalDefaults {
            default_seo: SeoRecord {
                content_type: Some(ContentType::Article),
                schema_type: Some(SchemaType::NewsArticle),
                og_type: Some(OgType::Article),
                ..Default::default()
            },
            ..Default::default()
        };
        let record = merge_seo(&RawDraft::default(), None, &global, &ctx(ContentKind::Page));
        assert_eq!(record.content_type, Some(ContentType::Article));
        assert_eq!(record.schema_type, Some(SchemaType::NewsArticle));
        assert_eq!(record.og_type, Some(OgType::Article));

        let existing = SeoRecord {
            schema_type: Some(SchemaType::Event),
            ..Default::default()
        };
        let record = merge_seo(&RawDraft::default(), Some(&existing), &global, &ctx(ContentKind::Page));
        assert_eq!(record.schema_type, Some(SchemaType::Event));
        assert_eq!(record.content_type, Some(ContentType::Article));
    }

    #[test]
    fn test_canonical_url_normalization() {
        let record = merge_seo(
            &draft(json!({"canonicalUrl": "/events/custom"})),
            None,
            &GlobalDefaults::default(),
            &ctx(ContentKind::Event),
        );
        assert_eq!(record.canonical_url.as_deref(), Some("https://example.com/events/custom"));
        assert_eq!(record.og_url, record.canonical_url);

        let mut no_site = ctx(ContentKind::Event);
        no_site.site_url = None;
        let record = merge_seo(
            &draft(json!({"canonicalUrl": "relative/path"})),
            None,
            &GlobalDefaults::default(),
            &no_site,
        );
        assert_eq!(
            record.canonical_url.as_deref(),
            Some("https://example.com/events/grand-opening")
        );
    }

    #[test]
    fn test_structured_data_parsing() {
        let existing = SeoRecord {
            structured_data: Some(json!({"@type": "Event"})),
            ..Default::default()
        };
        let record = merge_seo(
            &draft(json!({"structuredData": "{broken", "extraMeta": "{\"robots\":\"x\"}"})),
            Some(&existing),
            &GlobalDefaults::default(),
            &ctx(ContentKind::Event),
        );
        assert_eq!(record.structured_data, Some(json!({"@type": "Event"})));
        assert_eq!(record.extra_meta, Some(json!({"robots": "x"})));
    }

    #[test]
    fn test_confidence_clamped_and_baseline() {
        let merger = SeoPayloadMerger::default().with_generation(generation());
        let global = GlobalDefaults::default();
        let context = ctx(ContentKind::Page);

        let high = merger.merge(&draft(json!({"confidence": 7})), None, &global, &context);
        assert_eq!(high.ai_assistant.unwrap().confidence_score, Some(1.0));

        let nested = merger.merge(
            &draft(json!({"seo": {}, "ai": {"confidenceScore": "0.6"}})),
            None,
            &global,
            &context,
        );
        assert_eq!(nested.ai_assistant.unwrap().confidence_score, Some(0.6));

        let word = merger.merge(&draft(json!({"confidence": "high"})), None, &global, &context);
        assert_eq!(word.ai_assistant.unwrap().confidence_score, Some(0.85));
    }

    #[test]
    fn test_generation_refreshes_echo_fields() {
        let mut context = ctx(ContentKind::Page);
        context.prompt = Some("prompt text".into());
        let merger = SeoPayloadMerger::default().with_generation(generation());
        let record = merger.merge(
            &draft(json!({
                "metaTitle": "Fresh",
                "metaDescription": "New description",
                "secondaryKeywords": ["a", "A", "b"],
                "toneOfVoice": "friendly"
            })),
            None,
            &GlobalDefaults::default(),
            &context,
        );
        let ai = record.ai_assistant.unwrap();
        assert_eq!(ai.prompt.as_deref(), Some("prompt text"));
        assert_eq!(ai.generated_title.as_deref(), Some("Fresh"));
        assert_eq!(ai.generated_keywords, vec!["a", "b"]);
        assert_eq!(ai.tone_of_voice, Some(Tone::Friendly));
        assert_eq!(ai.provider.as_deref(), Some("openai"));
        assert_eq!(ai.last_generated_at.as_deref(), Some("2025-05-02T08:00:00.000Z"));
        assert_eq!(record.og_modified_time.as_deref(), Some("2025-05-01T00:00:00.000Z"));
    }

    #[test]
    fn test_meta_social_seeded_when_absent() {
        let record = merge_seo(
            &RawDraft::default(),
            None,
            &GlobalDefaults::default(),
            &ctx(ContentKind::Event),
        );
        let networks: Vec<_> = record
            .meta_social
            .iter()
            .filter_map(|e| e.social_network.as_deref())
            .collect();
        assert_eq!(networks, vec!["facebook", "linkedin", "twitter"]);
        assert_eq!(record.meta_social[0].title.as_deref(), Some("Grand Opening"));
        assert_eq!(
            record.meta_social[0].url.as_deref(),
            Some("https://example.com/events/grand-opening")
        );
    }

    #[test]
    fn test_meta_social_update_keeps_image() {
        let existing = SeoRecord {
            meta_social: vec![MetaSocialEntry {
                social_network: Some("facebook".into()),
                title: Some("Old".into()),
                image: Some(json!({"id": 5, "url": "/uploads/fb.png"})),
                image_alt: Some("FB alt".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let record = merge_seo(
            &draft(json!({"metaSocial": [
                {"socialNetwork": "facebook", "title": "New", "image": {"url": "/x.png"}},
                {"socialNetwork": "myspace", "title": "Nope"}
            ]})),
            Some(&existing),
            &GlobalDefaults::default(),
            &ctx(ContentKind::Event),
        );
        assert_eq!(record.meta_social.len(), 1);
        let facebook = &record.meta_social[0];
        assert_eq!(facebook.title.as_deref(), Some("New"));
        assert_eq!(facebook.image, Some(json!({"id": 5, "url": "/uploads/fb.png"})));
        assert_eq!(facebook.image_alt.as_deref(), Some("FB alt"));
    }

    #[test]
    fn test_meta_social_map_shape_and_duplicates() {
        let existing = vec![
            MetaSocialEntry {
                social_network: Some("twitter".into()),
                image: Some(json!({"id": 1})),
                ..Default::default()
            },
            MetaSocialEntry {
                social_network: Some("twitter".into()),
                title: Some("Second".into()),
                ..Default::default()
            },
        ];
        let merged = merge_meta_social(&existing, Vec::new());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title.as_deref(), Some("Second"));
        assert_eq!(merged[0].image, Some(json!({"id": 1})));

        let entries = build_social_entries(
            Some(&json!({"linkedin": {"description": "Pro"}})),
            "Fallback",
            None,
            Some("https://example.com/a"),
            Some("https://example.com"),
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Fallback"));
        assert_eq!(entries[0].description.as_deref(), Some("Pro"));
    }

    #[test]
    fn test_keywords_from_draft_variants() {
        let record = merge_seo(
            &draft(json!({"metaKeywords": "berlin, events, Berlin"})),
            None,
            &GlobalDefaults::default(),
            &ctx(ContentKind::Page),
        );
        assert_eq!(record.meta_keywords.as_deref(), Some("berlin, events"));

        let record = merge_seo(
            &draft(json!({"primaryKeyword": "opening"})),
            None,
            &GlobalDefaults::default(),
            &ctx(ContentKind::Page),
        );
        assert_eq!(record.meta_keywords.as_deref(), Some("opening"));
        assert_eq!(record.focus_keyword.as_deref(), Some("opening"));
    }
}
