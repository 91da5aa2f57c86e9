//! Core data models for seoforge.
//!
//! [`SeoRecord`] is the canonical persisted metadata bundle. Its enum fields
//! are closed domains; stored values outside a domain deserialize to `None`
//! instead of failing, so a corrupted row never blocks a merge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::text;

// =============================================================================
// CLOSED DOMAINS
// =============================================================================

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every member of the domain, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(concat!("Invalid ", stringify!($name), ": {}"), other)),
                }
            }
        }
    };
}

closed_enum! {
    /// Robots directive.
    MetaRobots {
        IndexFollow => "index,follow",
        IndexNofollow => "index,nofollow",
        NoindexFollow => "noindex,follow",
        NoindexNofollow => "noindex,nofollow",
    }
}

closed_enum! {
    /// Sitemap change frequency.
    ChangeFrequency {
        Always => "always",
        Hourly => "hourly",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
        Never => "never",
    }
}

closed_enum! {
    /// Coarse content classification.
    ContentType {
        Website => "website",
        Webpage => "webpage",
        Article => "article",
        News => "news",
        Event => "event",
        Product => "product",
        Faq => "faq",
        Custom => "custom",
    }
}

closed_enum! {
    /// schema.org type used for structured data.
    SchemaType {
        WebPage => "WebPage",
        Article => "Article",
        NewsArticle => "NewsArticle",
        BlogPosting => "BlogPosting",
        Event => "Event",
        Product => "Product",
        FaqPage => "FAQPage",
        HowTo => "HowTo",
        VideoObject => "VideoObject",
        Custom => "Custom",
    }
}

closed_enum! {
    /// Open Graph object type.
    OgType {
        Website => "website",
        Article => "article",
        Event => "event",
        Profile => "profile",
        Product => "product",
        Book => "book",
    }
}

closed_enum! {
    /// Twitter card layout.
    TwitterCard {
        Summary => "summary",
        SummaryLargeImage => "summary_large_image",
        Player => "player",
        App => "app",
    }
}

closed_enum! {
    /// Tone of voice requested from the generator.
    Tone {
        Informational => "informational",
        Conversational => "conversational",
        Professional => "professional",
        Playful => "playful",
        Urgent => "urgent",
        Authoritative => "authoritative",
        Friendly => "friendly",
        Luxury => "luxury",
        Technical => "technical",
    }
}

impl Tone {
    /// Case-insensitive parse.
    pub fn parse_loose(value: &str) -> Option<Self> {
        value.trim().to_lowercase().parse().ok()
    }
}

/// Parse a JSON string into a closed domain; anything else is `None`.
pub fn parse_enum<T: FromStr>(value: Option<&JsonValue>) -> Option<T> {
    value.and_then(JsonValue::as_str).and_then(|s| s.parse().ok())
}

// =============================================================================
// CONTENT KINDS
// =============================================================================

/// Kind of entity a record describes. Drives type-derived defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Page,
    Article,
    News,
    Event,
}

impl ContentKind {
    /// Unknown kinds resolve to `Page`.
    pub fn from_type(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Article => "article",
            Self::News => "news",
            Self::Event => "event",
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Page => ContentType::Webpage,
            Self::Article => ContentType::Article,
            Self::News => ContentType::News,
            Self::Event => ContentType::Event,
        }
    }

    pub fn schema_type(&self) -> SchemaType {
        match self {
            Self::Page => SchemaType::WebPage,
            Self::Article => SchemaType::Article,
            Self::News => SchemaType::NewsArticle,
            Self::Event => SchemaType::Event,
        }
    }

    pub fn og_type(&self) -> OgType {
        match self {
            Self::Page => OgType::Website,
            Self::Article | Self::News => OgType::Article,
            Self::Event => OgType::Event,
        }
    }

    pub fn sitemap_priority(&self) -> f64 {
        match self {
            Self::Page => 0.8,
            Self::Article => 0.6,
            Self::News | Self::Event => 0.7,
        }
    }

    pub fn sitemap_change_freq(&self) -> ChangeFrequency {
        match self {
            Self::Page | Self::Event => ChangeFrequency::Weekly,
            Self::Article | Self::News => ChangeFrequency::Daily,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "page" => Ok(Self::Page),
            "article" => Ok(Self::Article),
            "news" => Ok(Self::News),
            "event" => Ok(Self::Event),
            other => Err(format!("Invalid content kind: {}", other)),
        }
    }
}

// =============================================================================
// LENIENT DESERIALIZERS
// =============================================================================

fn lenient_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(parse_enum(value.as_ref()))
}

fn lenient_tone<'de, D>(deserializer: D) -> Result<Option<Tone>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(JsonValue::as_str).and_then(Tone::parse_loose))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(text::as_number(value.as_ref()))
}

fn lenient_object<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_json_object))
}

/// `null` reads as the type's default, like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(text::keyword_list(value.as_ref()))
}

/// A JSON object, given either directly or as JSON text. Invalid text and
/// non-object values are `None`.
pub fn parse_json_object(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Object(_) => Some(value.clone()),
        JsonValue::String(s) => match serde_json::from_str::<JsonValue>(s.trim()) {
            Ok(parsed @ JsonValue::Object(_)) => Some(parsed),
            _ => None,
        },
        _ => None,
    }
}

// =============================================================================
// SEO RECORD
// =============================================================================

/// Per-network social override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSocialEntry {
    #[serde(default, alias = "network", skip_serializing_if = "Option::is_none")]
    pub social_network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Media reference; only set by people or the media pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    /// Host fields this crate does not interpret (ids and the like).
    #[serde(flatten)]
    pub other: Map<String, JsonValue>,
}

/// Provenance and inputs of the last AI generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAssistant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_tone",
        skip_serializing_if = "Option::is_none"
    )]
    pub tone_of_voice: Option<Tone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_keyword: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_keywords",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub secondary_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_keywords",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub generated_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_generated_at: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, JsonValue>,
}

/// Canonical persisted SEO metadata for one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoRecord {
    /// At most 70 characters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta_title: String,
    /// At most 165 characters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta_description: String,
    /// Comma-joined, at most 255 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta_robots: Option<MetaRobots>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_viewport: Option<String>,
    /// Within `[0, 1]`.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub sitemap_priority: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub sitemap_change_freq: Option<ChangeFrequency>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<ContentType>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_type: Option<SchemaType>,
    #[serde(
        default,
        deserialize_with = "lenient_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_image: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_image_alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub og_type: Option<OgType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_published_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_modified_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub twitter_card: Option<TwitterCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_creator: Option<String>,
    /// Unique by network.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub meta_social: Vec<MetaSocialEntry>,
    #[serde(
        default,
        deserialize_with = "lenient_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub extra_meta: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_assistant: Option<AiAssistant>,
    /// Host fields this crate does not interpret.
    #[serde(flatten)]
    pub other: Map<String, JsonValue>,
}

impl SeoRecord {
    /// Read the `seo` attribute of a host entity. Missing, `null` or
    /// malformed values yield `None`.
    pub fn from_entity(entity: &JsonValue) -> Option<Self> {
        let seo = entity.get("seo")?;
        if !seo.is_object() {
            return None;
        }
        serde_json::from_value(seo.clone()).ok()
    }

    /// Whether title or description is missing, the backfill criterion.
    pub fn is_incomplete(&self) -> bool {
        self.meta_title.trim().is_empty() || self.meta_description.trim().is_empty()
    }
}

/// Site-wide settings used as last-resort fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<JsonValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_seo: SeoRecord,
}
