//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use crate::defaults;
use crate::models::{ContentKind, Tone};
use crate::url::sanitize_base_url;

/// Settings for the outbound text-generation call.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    /// Provider label stored in `aiAssistant.provider`.
    pub provider: String,
    pub enabled: bool,
    pub timeout: Duration,
    /// Within `[0, 2]`.
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: defaults::GENERATION_ENDPOINT.to_string(),
            model: defaults::GENERATION_MODEL.to_string(),
            provider: defaults::GENERATION_PROVIDER.to_string(),
            enabled: true,
            timeout: Duration::from_millis(defaults::GENERATION_TIMEOUT_MS),
            temperature: defaults::GENERATION_TEMPERATURE,
            max_tokens: defaults::GENERATION_MAX_TOKENS,
        }
    }
}

impl GenerationConfig {
    /// Enabled and holding a credential.
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }
}

/// Bounds and defaults for prompt-context extraction.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub default_tone: Tone,
    pub default_audience: String,
    pub max_text_length: usize,
    pub max_snippets: usize,
    /// BCP-47 locale used for `metaLanguage`.
    pub locale: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_tone: Tone::Informational,
            default_audience: defaults::AUDIENCE.to_string(),
            max_text_length: defaults::CONTEXT_MAX_TEXT_LENGTH,
            max_snippets: defaults::CONTEXT_MAX_SNIPPETS,
            locale: defaults::LOCALE.to_string(),
        }
    }
}

/// Public base path per content kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePaths {
    pub page: String,
    pub article: String,
    pub news: String,
    pub event: String,
}

impl Default for BasePaths {
    fn default() -> Self {
        Self {
            page: "/".to_string(),
            article: "/news".to_string(),
            news: "/news".to_string(),
            event: "/events".to_string(),
        }
    }
}

impl BasePaths {
    pub fn for_kind(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Page => &self.page,
            ContentKind::Article => &self.article,
            ContentKind::News => &self.news,
            ContentKind::Event => &self.event,
        }
    }
}

/// Backfill sweep settings. The schedule itself is run by the host.
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    pub enabled: bool,
    /// At least 1.
    pub batch_size: usize,
    pub schedule: String,
    pub timezone: String,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: defaults::BACKFILL_BATCH,
            schedule: defaults::BACKFILL_SCHEDULE.to_string(),
            timezone: defaults::BACKFILL_TIMEZONE.to_string(),
        }
    }
}

/// Complete seoforge configuration.
#[derive(Debug, Clone)]
pub struct SeoConfig {
    pub generation: GenerationConfig,
    pub context: ContextConfig,
    pub base_paths: BasePaths,
    /// Public site origin, sanitized.
    pub site_url: Option<String>,
    /// Host backend origin, sanitized. Prefix for relative media URLs.
    pub backend_url: String,
    pub production: bool,
    pub cache_ttl: Duration,
    pub backfill: BackfillConfig,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            context: ContextConfig::default(),
            base_paths: BasePaths::default(),
            site_url: None,
            backend_url: defaults::BACKEND_URL.to_string(),
            production: false,
            cache_ttl: Duration::from_millis(defaults::GLOBAL_CACHE_TTL_MS),
            backfill: BackfillConfig::default(),
        }
    }
}

impl SeoConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `OPENAI_API_KEY` | unset | Generation credential |
    /// | `OPENAI_SEO_ENDPOINT` | OpenAI chat completions | Endpoint URL |
    /// | `OPENAI_SEO_MODEL` | `gpt-4o-mini` | Model id |
    /// | `OPENAI_SEO_PROVIDER` | `openai` | Provider label |
    /// | `OPENAI_SEO_ENABLED` | `true` | Enable generation |
    /// | `OPENAI_SEO_TIMEOUT` | `20000` | Request timeout (ms) |
    /// | `OPENAI_SEO_TEMPERATURE` | `0.4` | Clamped to `[0, 2]` |
    /// | `OPENAI_SEO_MAX_TOKENS` | `600` | Completion token cap |
    /// | `OPENAI_SEO_TONE` | `informational` | Default tone |
    /// | `OPENAI_SEO_AUDIENCE` | `general website visitors` | Default audience |
    /// | `OPENAI_SEO_CONTENT_LIMIT` | `4000` | Context text cap |
    /// | `OPENAI_SEO_SNIPPET_COUNT` | `60` | Context snippet cap |
    /// | `SEO_LOCALE` | `de-DE` | Content language |
    /// | `SEO_{PAGE,ARTICLE,NEWS,EVENT}_BASE_PATH` | `/`, `/news`, `/news`, `/events` | Public paths |
    /// | `PUBLIC_SITE_URL` / `FRONTEND_URL` / `SITE_URL` | unset | Site origin |
    /// | `BACKEND_URL` / `STRAPI_URL` | `http://localhost:1337` | Backend origin |
    /// | `APP_ENV` / `NODE_ENV` | `development` | `production` disables the backend fallback |
    /// | `SEO_GLOBAL_CACHE_TTL` | `300000` | Global defaults TTL (ms) |
    /// | `SEO_CRON_ENABLED` | `true` | Enable backfill |
    /// | `SEO_CRON_BATCH` | `3` | Entities per type per run |
    /// | `SEO_CRON_RULE` | `*/5 * * * *` | Backfill schedule |
    /// | `SEO_CRON_TZ` | `Europe/Berlin` | Schedule timezone |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(key));
        let flag = |key: &str, default: bool| {
            get(key)
                .map(|v| {
                    let v = v.to_lowercase();
                    v != "false" && v != "0"
                })
                .unwrap_or(default)
        };

        let generation = GenerationConfig {
            api_key: get("OPENAI_API_KEY"),
            endpoint: get("OPENAI_SEO_ENDPOINT")
                .unwrap_or_else(|| defaults::GENERATION_ENDPOINT.to_string()),
            model: get("OPENAI_SEO_MODEL").unwrap_or_else(|| defaults::GENERATION_MODEL.to_string()),
            provider: get("OPENAI_SEO_PROVIDER")
                .unwrap_or_else(|| defaults::GENERATION_PROVIDER.to_string()),
            enabled: flag("OPENAI_SEO_ENABLED", true),
            timeout: Duration::from_millis(
                get("OPENAI_SEO_TIMEOUT")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(defaults::GENERATION_TIMEOUT_MS),
            ),
            temperature: get("OPENAI_SEO_TEMPERATURE")
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|t| t.is_finite())
                .unwrap_or(defaults::GENERATION_TEMPERATURE)
                .clamp(0.0, 2.0),
            max_tokens: get("OPENAI_SEO_MAX_TOKENS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults::GENERATION_MAX_TOKENS),
        };

        let context = ContextConfig {
            default_tone: get("OPENAI_SEO_TONE")
                .and_then(|v| Tone::parse_loose(&v))
                .unwrap_or(Tone::Informational),
            default_audience: get("OPENAI_SEO_AUDIENCE")
                .unwrap_or_else(|| defaults::AUDIENCE.to_string()),
            max_text_length: get("OPENAI_SEO_CONTENT_LIMIT")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults::CONTEXT_MAX_TEXT_LENGTH),
            max_snippets: get("OPENAI_SEO_SNIPPET_COUNT")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults::CONTEXT_MAX_SNIPPETS),
            locale: get("SEO_LOCALE").unwrap_or_else(|| defaults::LOCALE.to_string()),
        };

        let base_paths = BasePaths {
            page: get("SEO_PAGE_BASE_PATH").unwrap_or_else(|| "/".to_string()),
            article: first(&["SEO_ARTICLE_BASE_PATH", "SEO_NEWS_BASE_PATH"])
                .unwrap_or_else(|| "/news".to_string()),
            news: first(&["SEO_NEWS_BASE_PATH", "SEO_ARTICLE_BASE_PATH"])
                .unwrap_or_else(|| "/news".to_string()),
            event: get("SEO_EVENT_BASE_PATH").unwrap_or_else(|| "/events".to_string()),
        };

        let backfill = BackfillConfig {
            enabled: flag("SEO_CRON_ENABLED", true),
            batch_size: get("SEO_CRON_BATCH")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults::BACKFILL_BATCH)
                .max(1),
            schedule: get("SEO_CRON_RULE").unwrap_or_else(|| defaults::BACKFILL_SCHEDULE.to_string()),
            timezone: get("SEO_CRON_TZ").unwrap_or_else(|| defaults::BACKFILL_TIMEZONE.to_string()),
        };

        let production = first(&["APP_ENV", "NODE_ENV"])
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Self {
            generation,
            context,
            base_paths,
            site_url: first(&["PUBLIC_SITE_URL", "FRONTEND_URL", "SITE_URL"])
                .map(|v| sanitize_base_url(&v))
                .filter(|v| !v.is_empty()),
            backend_url: sanitize_base_url(
                &first(&["BACKEND_URL", "STRAPI_URL"])
                    .unwrap_or_else(|| defaults::BACKEND_URL.to_string()),
            ),
            production,
            cache_ttl: Duration::from_millis(
                get("SEO_GLOBAL_CACHE_TTL")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(defaults::GLOBAL_CACHE_TTL_MS),
            ),
            backfill,
        }
    }

    /// Site origin used for canonical URLs.
    ///
    /// Outside production, a missing site URL falls back to the backend
    /// origin; in production it stays unset.
    pub fn effective_site_url(&self) -> Option<String> {
        match &self.site_url {
            Some(url) => Some(url.clone()),
            None if !self.production => Some(self.backend_url.clone()),
            None => None,
        }
    }

    pub fn with_site_url(mut self, url: impl AsRef<str>) -> Self {
        let url = sanitize_base_url(url.as_ref());
        self.site_url = (!url.is_empty()).then_some(url);
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.generation.api_key = Some(key.into());
        self
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = SeoConfig::from_lookup(lookup(&[]));
        assert!(config.generation.api_key.is_none());
        assert!(!config.generation.is_active());
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.timeout, Duration::from_millis(20_000));
        assert_eq!(config.context.default_tone, Tone::Informational);
        assert_eq!(config.base_paths.event, "/events");
        assert_eq!(config.backend_url, "http://localhost:1337");
        assert_eq!(config.backfill.batch_size, 3);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(!config.production);
    }

    #[test]
    fn test_generation_overrides() {
        let config = SeoConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_SEO_ENABLED", "FALSE"),
            ("OPENAI_SEO_TEMPERATURE", "5"),
            ("OPENAI_SEO_TIMEOUT", "1500"),
            ("OPENAI_SEO_TONE", "Playful"),
        ]));
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-test"));
        assert!(!config.generation.enabled);
        assert!(!config.generation.is_active());
        assert_eq!(config.generation.temperature, 2.0);
        assert_eq!(config.generation.timeout, Duration::from_millis(1500));
        assert_eq!(config.context.default_tone, Tone::Playful);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = SeoConfig::from_lookup(lookup(&[
            ("OPENAI_SEO_TEMPERATURE", "warm"),
            ("SEO_CRON_BATCH", "0"),
            ("OPENAI_SEO_TONE", "sarcastic"),
        ]));
        assert_eq!(config.generation.temperature, 0.4);
        assert_eq!(config.backfill.batch_size, 1);
        assert_eq!(config.context.default_tone, Tone::Informational);
    }

    #[test]
    fn test_base_paths_fall_back_to_each_other() {
        let config = SeoConfig::from_lookup(lookup(&[("SEO_NEWS_BASE_PATH", "/blog")]));
        assert_eq!(config.base_paths.article, "/blog");
        assert_eq!(config.base_paths.news, "/blog");
        assert_eq!(config.base_paths.for_kind(ContentKind::Page), "/");
    }

    #[test]
    fn test_site_url_sanitized_and_preferred() {
        let config = SeoConfig::from_lookup(lookup(&[
            ("FRONTEND_URL", "https:/www.example.com/"),
            ("SITE_URL", "https://ignored.example"),
        ]));
        assert_eq!(config.site_url.as_deref(), Some("https://www.example.com"));
        assert_eq!(config.effective_site_url().as_deref(), Some("https://www.example.com"));
    }

    #[test]
    fn test_effective_site_url_backend_fallback() {
        let dev = SeoConfig::from_lookup(lookup(&[("STRAPI_URL", "http://cms:1337/")]));
        assert_eq!(dev.effective_site_url().as_deref(), Some("http://cms:1337"));

        let prod = SeoConfig::from_lookup(lookup(&[("NODE_ENV", "production")]));
        assert!(prod.production);
        assert_eq!(prod.effective_site_url(), None);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = SeoConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")]));
        assert!(config.generation.api_key.is_none());
    }
}
