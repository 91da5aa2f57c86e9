//! Prompt construction for SEO metadata synthesis.
//!
//! The prompt has three parts: plain instructions, a literal JSON shape
//! listing every expected field with its length limit or closed domain, and
//! the serialized [`SeoContext`].

use serde_json::{json, Value as JsonValue};

use seoforge_core::defaults::{
    LOCALE, META_DESCRIPTION_MAX, META_TITLE_MAX, OG_LOCALE, SOCIAL_NETWORKS,
};
use seoforge_core::{
    ChangeFrequency, ContentType, MetaRobots, OgType, SchemaType, SeoContext, Tone, TwitterCard,
};

/// System message sent with every synthesis request.
pub const SYSTEM_MESSAGE: &str =
    "You are an experienced SEO specialist. Respond with JSON only, without commentary.";

/// Builds the user prompt for one [`SeoContext`].
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    locale: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(LOCALE)
    }
}

impl PromptBuilder {
    /// `locale` is the BCP-47 language the metadata must be written in.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    pub fn system_message(&self) -> &'static str {
        SYSTEM_MESSAGE
    }

    /// Full prompt: instructions, output shape, page data.
    pub fn build(&self, context: &SeoContext) -> String {
        let payload = serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string());
        let shape = serde_json::to_string_pretty(&self.response_shape())
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "{}\n\nJSON shape:\n{}\n\nPage data:\n{}",
            self.instructions(context),
            shape,
            payload
        )
    }

    fn instructions(&self, context: &SeoContext) -> String {
        [
            format!(
                "Create complete SEO metadata in {} for a {} ({}).",
                self.locale,
                context.label,
                context.kind.as_str()
            ),
            "Use a clear, search-friendly writing style.".to_string(),
            "Stay with the given content and invent nothing it does not mention.".to_string(),
            format!(
                "Respect the length limits ({} characters for the title, {} for the description).",
                META_TITLE_MAX, META_DESCRIPTION_MAX
            ),
            "Use keywords sensibly, without keyword stuffing.".to_string(),
            "Return JSON that matches the described shape exactly, with no additional text."
                .to_string(),
            "Do not produce image or media references.".to_string(),
        ]
        .join(" ")
    }

    /// Literal description of the expected response object.
    pub fn response_shape(&self) -> JsonValue {
        json!({
            "metaTitle": format!("string (<= {} characters)", META_TITLE_MAX),
            "metaDescription": format!("string (<= {} characters)", META_DESCRIPTION_MAX),
            "metaKeywords": ["keyword1", "keyword2"],
            "focusKeyword": "string",
            "metaRobots": domain(MetaRobots::ALL.iter().map(MetaRobots::as_str)),
            "metaLanguage": format!("BCP-47 locale, e.g. {}", self.locale),
            "metaViewport": "string",
            "sitemapPriority": "0 - 1",
            "sitemapChangeFreq": domain(ChangeFrequency::ALL.iter().map(ChangeFrequency::as_str)),
            "contentType": domain(ContentType::ALL.iter().map(ContentType::as_str)),
            "schemaType": domain(SchemaType::ALL.iter().map(SchemaType::as_str)),
            "structuredData": {"@context": "https://schema.org", "@type": "..."},
            "shareImageAlt": "string",
            "ogTitle": "string",
            "ogDescription": "string",
            "ogType": domain(OgType::ALL.iter().map(OgType::as_str)),
            "ogLocale": OG_LOCALE,
            "twitterCard": domain(TwitterCard::ALL.iter().map(TwitterCard::as_str)),
            "twitterCreator": "@handle or empty",
            "metaSocial": [{
                "socialNetwork": domain(SOCIAL_NETWORKS.iter().copied()),
                "title": "string",
                "description": "string",
                "url": "absolute URL"
            }],
            "extraMeta": {"name-or-property": "value"},
            "primaryKeyword": "string",
            "secondaryKeywords": ["keyword"],
            "callToAction": "string",
            "toneOfVoice": domain(Tone::ALL.iter().map(Tone::as_str)),
            "confidence": "0 - 1"
        })
    }
}

fn domain<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(" | ")
}
