//! Serving-side view of an entity's SEO metadata.
//!
//! [`render_seo_meta`] resolves the entity's record, the global default
//! record and the entity's own fields into a compact [`SeoMeta`] that a
//! frontend can turn into `<meta>` tags. When no structured data is stored
//! it synthesizes schema.org JSON-LD for the content kind.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::config::SeoConfig;
use crate::defaults;
use crate::media::{self, MediaDescriptor};
use crate::models::{
    AiAssistant, ChangeFrequency, ContentKind, ContentType, GlobalDefaults, MetaRobots,
    MetaSocialEntry, OgType, SchemaType, SeoRecord, TwitterCard,
};
use crate::text;
use crate::url::{canonical_path, ensure_absolute_url, origin_of};

/// Sitemap hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapHints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_frequency: Option<ChangeFrequency>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub og_type: OgType,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterMeta {
    pub card: TwitterCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
}

/// Public metadata for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub keywords: Option<String>,
    pub keyword_list: Vec<String>,
    pub focus_keyword: Option<String>,
    pub canonical_url: Option<String>,
    pub robots: MetaRobots,
    pub viewport: String,
    pub language: String,
    pub content_type: ContentType,
    pub schema_type: SchemaType,
    pub sitemap: SitemapHints,
    pub share_image: Option<MediaDescriptor>,
    pub open_graph: OpenGraph,
    pub twitter: TwitterMeta,
    pub social: Vec<SocialMeta>,
    pub structured_data: Option<JsonValue>,
    pub ai_assistant: Option<AiAssistant>,
    pub extra_meta: Option<JsonValue>,
}

/// Render the public metadata of `entity`.
///
/// `fallback_image` is a raw media record used when neither the entity nor
/// the global default record carries a share image.
pub fn render_seo_meta(
    entity: &JsonValue,
    kind: ContentKind,
    global: &GlobalDefaults,
    config: &SeoConfig,
    fallback_image: Option<&JsonValue>,
) -> SeoMeta {
    let seo = SeoRecord::from_entity(entity).unwrap_or_default();
    let fallback = &global.default_seo;
    let site_url = config.effective_site_url();
    let site = site_url.as_deref();
    let backend = config.backend_url.as_str();
    let field = |key: &str| text::as_text(entity.get(key));

    let canonical_url = opt(&seo.canonical_url)
        .or_else(|| opt(&fallback.canonical_url))
        .map(|url| ensure_absolute_url(&url, site))
        .or_else(|| {
            let site = site?;
            let slug = field("slug").unwrap_or_default();
            let path = canonical_path(
                config.base_paths.for_kind(kind),
                &slug,
                kind == ContentKind::Page,
            );
            Some(if path == "/" {
                site.to_string()
            } else {
                format!("{}{}", site, path)
            })
        });

    let title = first([
        nonblank(&seo.meta_title),
        field("title"),
        nonblank(&fallback.meta_title),
        global.site_name.clone(),
    ])
    .unwrap_or_else(|| defaults::TITLE_PLACEHOLDER.to_string());

    let description = first([
        nonblank(&seo.meta_description),
        field("summary"),
        field("subtitle"),
        nonblank(&fallback.meta_description),
        global.site_description.clone(),
    ])
    .unwrap_or_default();

    let share_image_raw = seo
        .share_image
        .as_ref()
        .or(fallback.share_image.as_ref())
        .or(fallback_image);
    let share_image = media::normalize(share_image_raw, backend);
    let favicon = media::normalize(global.favicon.as_ref(), backend);

    let keywords = opt(&seo.meta_keywords).or_else(|| opt(&fallback.meta_keywords));
    let keyword_list = text::unique_strings(
        text::split_keywords(keywords.as_deref().unwrap_or_default())
            .into_iter()
            .chain(seo.focus_keyword.iter().flat_map(|k| text::split_keywords(k)))
            .chain(assistant_keywords(seo.ai_assistant.as_ref()))
            .chain(assistant_keywords(fallback.ai_assistant.as_ref())),
    );

    let og_title = opt(&seo.og_title).unwrap_or_else(|| title.clone());
    let og_description = opt(&seo.og_description).unwrap_or_else(|| description.clone());
    let og_type = seo.og_type.or(fallback.og_type).unwrap_or_else(|| kind.og_type());
    let og_locale = opt(&seo.og_locale)
        .or_else(|| opt(&fallback.og_locale))
        .unwrap_or_else(|| defaults::OG_LOCALE.to_string());

    let published_time = opt(&seo.og_published_time)
        .or_else(|| field("publicationDate"))
        .or_else(|| field("startDate"))
        .or_else(|| field("createdAt"));
    let modified_time = opt(&seo.og_modified_time)
        .or_else(|| field("updatedAt"))
        .or_else(|| field("publishedAt"));

    let social_entries = if seo.meta_social.is_empty() {
        &fallback.meta_social
    } else {
        &seo.meta_social
    };
    let social = social_entries
        .iter()
        .map(|entry| social_meta(entry, share_image_raw, canonical_url.as_deref(), site, backend))
        .collect();

    let structured_data = seo
        .structured_data
        .clone()
        .or_else(|| fallback.structured_data.clone())
        .or_else(|| {
            let input = SchemaInput {
                title: &title,
                description: &description,
                canonical_url: canonical_url.as_deref(),
                image: share_image.as_ref(),
                entity,
                site_name: global.site_name.as_deref(),
                favicon: favicon.as_ref(),
            };
            Some(build_default_schema(kind, &input))
        });

    SeoMeta {
        keywords,
        keyword_list,
        focus_keyword: opt(&seo.focus_keyword).or_else(|| opt(&fallback.focus_keyword)),
        robots: seo
            .meta_robots
            .or(fallback.meta_robots)
            .unwrap_or(MetaRobots::IndexFollow),
        viewport: opt(&seo.meta_viewport)
            .or_else(|| opt(&fallback.meta_viewport))
            .unwrap_or_else(|| defaults::META_VIEWPORT.to_string()),
        language: opt(&seo.meta_language)
            .or_else(|| opt(&fallback.meta_language))
            .unwrap_or_else(|| config.context.locale.clone()),
        content_type: seo
            .content_type
            .or(fallback.content_type)
            .unwrap_or_else(|| kind.content_type()),
        schema_type: seo
            .schema_type
            .or(fallback.schema_type)
            .unwrap_or_else(|| kind.schema_type()),
        sitemap: SitemapHints {
            priority: seo.sitemap_priority.or(fallback.sitemap_priority),
            change_frequency: seo.sitemap_change_freq.or(fallback.sitemap_change_freq),
        },
        open_graph: OpenGraph {
            title: og_title.clone(),
            description: og_description.clone(),
            og_type,
            locale: og_locale,
            url: opt(&seo.og_url)
                .or_else(|| canonical_url.clone())
                .map(|url| ensure_absolute_url(&url, site)),
            site_name: global.site_name.clone(),
            published_time,
            modified_time,
            image: share_image.clone(),
        },
        twitter: TwitterMeta {
            card: seo
                .twitter_card
                .or(fallback.twitter_card)
                .unwrap_or(TwitterCard::SummaryLargeImage),
            creator: opt(&seo.twitter_creator).or_else(|| opt(&fallback.twitter_creator)),
            title: og_title,
            description: og_description,
            image: share_image.clone(),
        },
        social,
        structured_data,
        ai_assistant: seo.ai_assistant.clone().or_else(|| fallback.ai_assistant.clone()),
        extra_meta: seo.extra_meta.clone().or_else(|| fallback.extra_meta.clone()),
        share_image,
        canonical_url,
        title,
        description,
    }
}

fn social_meta(
    entry: &MetaSocialEntry,
    fallback_image: Option<&JsonValue>,
    canonical_url: Option<&str>,
    site_url: Option<&str>,
    backend: &str,
) -> SocialMeta {
    let image = media::normalize(entry.image.as_ref().or(fallback_image), backend);
    let url = opt(&entry.url)
        .or_else(|| canonical_url.map(str::to_string))
        .map(|url| ensure_absolute_url(&url, site_url));
    SocialMeta {
        network: opt(&entry.social_network),
        title: opt(&entry.title),
        description: opt(&entry.description),
        url,
        image_alt: opt(&entry.image_alt)
            .or_else(|| image.as_ref().and_then(|i| i.alternative_text.clone())),
        image,
    }
}

fn assistant_keywords(assistant: Option<&AiAssistant>) -> Vec<String> {
    assistant
        .map(|ai| {
            ai.generated_keywords
                .iter()
                .chain(ai.secondary_keywords.iter())
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// JSON-LD
// =============================================================================

/// Inputs for default structured data.
#[derive(Debug, Clone, Copy)]
pub struct SchemaInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub canonical_url: Option<&'a str>,
    pub image: Option<&'a MediaDescriptor>,
    pub entity: &'a JsonValue,
    pub site_name: Option<&'a str>,
    pub favicon: Option<&'a MediaDescriptor>,
}

/// schema.org JSON-LD for the kind: `NewsArticle` for articles and news,
/// `Event` for events, `WebPage` otherwise.
pub fn build_default_schema(kind: ContentKind, input: &SchemaInput<'_>) -> JsonValue {
    match kind {
        ContentKind::Article | ContentKind::News => news_article_schema(input),
        ContentKind::Event => event_schema(input),
        ContentKind::Page => web_page_schema(input),
    }
}

fn web_page_schema(input: &SchemaInput<'_>) -> JsonValue {
    compact(json!({
        "@context": "https://schema.org",
        "@type": "WebPage",
        "name": input.title,
        "description": input.description,
        "url": input.canonical_url,
        "image": image_list(input.image),
        "isPartOf": input.site_name.map(|name| compact(json!({
            "@type": "WebSite",
            "name": name,
            "url": input.canonical_url.and_then(origin_of),
        }))),
    }))
}

fn news_article_schema(input: &SchemaInput<'_>) -> JsonValue {
    let entity = input.entity;
    compact(json!({
        "@context": "https://schema.org",
        "@type": "NewsArticle",
        "headline": input.title,
        "description": input.description,
        "url": input.canonical_url,
        "image": image_list(input.image),
        "datePublished": text::as_text(entity.get("publicationDate"))
            .or_else(|| text::as_text(entity.get("createdAt"))),
        "dateModified": text::as_text(entity.get("updatedAt")),
        "author": input.site_name.map(|name| json!({"@type": "Organization", "name": name})),
        "publisher": input.site_name.map(|name| compact(json!({
            "@type": "Organization",
            "name": name,
            "logo": input.favicon.map(|f| json!({"@type": "ImageObject", "url": f.url})),
        }))),
        "mainEntityOfPage": input.canonical_url.map(|url| json!({"@type": "WebPage", "@id": url})),
    }))
}

fn event_schema(input: &SchemaInput<'_>) -> JsonValue {
    let entity = input.entity;
    let field = |key: &str| text::as_text(entity.get(key));
    let event_status = field("eventStatus");

    let attendance_mode = match field("locationType").as_deref() {
        Some("online") => "https://schema.org/OnlineEventAttendanceMode",
        Some("hybrid") => "https://schema.org/MixedEventAttendanceMode",
        _ => "https://schema.org/OfflineEventAttendanceMode",
    };

    let location = entity.get("address").and_then(|address| {
        let street = text::as_text(address.get("street"))?;
        let part = |key: &str| text::as_text(address.get(key));
        Some(compact(json!({
            "@type": "Place",
            "name": field("venueName").or_else(|| part("label")),
            "address": compact(json!({
                "@type": "PostalAddress",
                "streetAddress": street,
                "postalCode": part("zip"),
                "addressLocality": part("city"),
                "addressRegion": part("state"),
                "addressCountry": part("country"),
            })),
        })))
    });

    let offers = entity
        .get("priceDetails")
        .filter(|v| !v.is_null() && v.as_str().map_or(true, |s| !s.trim().is_empty()))
        .map(|price| {
            let availability = if event_status.as_deref() == Some("sold-out") {
                "https://schema.org/SoldOut"
            } else {
                "https://schema.org/InStock"
            };
            compact(json!({
                "@type": "Offer",
                "price": price,
                "priceCurrency": "EUR",
                "url": input.canonical_url,
                "availability": availability,
            }))
        });

    compact(json!({
        "@context": "https://schema.org",
        "@type": "Event",
        "name": input.title,
        "description": input.description,
        "url": input.canonical_url,
        "image": image_list(input.image),
        "startDate": field("startDate"),
        "endDate": field("endDate"),
        "eventStatus": event_status.as_ref().map(|s| format!("https://schema.org/{}", s)),
        "eventAttendanceMode": attendance_mode,
        "location": location,
        "organizer": input.site_name.map(|name| json!({"@type": "Organization", "name": name})),
        "offers": offers,
    }))
}

fn image_list(image: Option<&MediaDescriptor>) -> Option<Vec<String>> {
    image.map(|i| vec![i.url.clone()])
}

/// Drop `null`, empty-string, empty-array and empty-object members from a
/// JSON object.
pub fn compact(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .filter(|(_, v)| match v {
                    JsonValue::Null => false,
                    JsonValue::String(s) => !s.is_empty(),
                    JsonValue::Array(items) => !items.is_empty(),
                    JsonValue::Object(inner) => !inner.is_empty(),
                    _ => true,
                })
                .collect(),
        ),
        other => other,
    }
}

fn nonblank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn opt(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(nonblank)
}

fn first<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|c| !c.trim().is_empty())
}
