//! AI metadata synthesis: context, prompt, generation call, response parsing.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use seoforge_core::{
    ContentKind, GenerationBackend, GenerationConfig, GenerationFailure, GenerationInfo, RawDraft,
    SeoContext, SeoContextBuilder,
};

use crate::prompt::PromptBuilder;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)```").expect("valid regex"));
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z0-9_-]*\s*(.*?)```").expect("valid regex"));

/// Parse a generation response into a JSON object.
///
/// A ```` ```json ```` fence is preferred over a bare fence; unfenced text is
/// parsed as is.
pub fn parse_ai_json(content: &str) -> Result<JsonValue, GenerationFailure> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(GenerationFailure::InvalidResponse("empty response".to_string()));
    }

    let body = JSON_FENCE
        .captures(trimmed)
        .or_else(|| ANY_FENCE.captures(trimmed))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    let value: JsonValue = serde_json::from_str(body)
        .map_err(|e| GenerationFailure::InvalidResponse(format!("not JSON: {}", e)))?;
    if !value.is_object() {
        return Err(GenerationFailure::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    }
    Ok(value)
}

/// Successful synthesis of one entity.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub draft: RawDraft,
    /// Context the prompt was built from, with `prompt` set.
    pub context: SeoContext,
    pub info: GenerationInfo,
}

/// Turns an entity into a raw metadata draft via a [`GenerationBackend`].
///
/// Never retries. Every failure is returned as a [`GenerationFailure`] so a
/// sweep can move on to the next entity.
pub struct AiMetadataSynthesizer {
    backend: Arc<dyn GenerationBackend>,
    config: GenerationConfig,
    contexts: SeoContextBuilder,
    prompts: PromptBuilder,
}

impl AiMetadataSynthesizer {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        config: GenerationConfig,
        contexts: SeoContextBuilder,
    ) -> Self {
        let prompts = PromptBuilder::new(contexts.config().locale.clone());
        Self {
            backend,
            config,
            contexts,
            prompts,
        }
    }

    pub fn backend(&self) -> &Arc<dyn GenerationBackend> {
        &self.backend
    }

    pub fn context_builder(&self) -> &SeoContextBuilder {
        &self.contexts
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Build the context for `entity` and synthesize a draft from it.
    pub async fn synthesize(
        &self,
        entity: &JsonValue,
        kind: ContentKind,
        label: &str,
        site_url: Option<&str>,
    ) -> Result<Synthesis, GenerationFailure> {
        let context = self.contexts.build_context(entity, kind, label, site_url);
        self.synthesize_context(context).await
    }

    /// Synthesize a draft from a prepared context.
    pub async fn synthesize_context(
        &self,
        mut context: SeoContext,
    ) -> Result<Synthesis, GenerationFailure> {
        if !self.config.enabled {
            return Err(GenerationFailure::Disabled);
        }

        let prompt = self.prompts.build(&context);
        debug!(
            kind = %context.kind,
            slug = %context.slug,
            prompt_chars = prompt.len(),
            "Prompt built"
        );

        let started = Instant::now();
        let call = self
            .backend
            .generate_with_system(self.prompts.system_message(), &prompt);
        let content = tokio::time::timeout(self.config.timeout, call)
            .await
            .map_err(|_| GenerationFailure::Timeout(self.config.timeout))??;

        let draft = RawDraft::from_value(parse_ai_json(&content)?);
        info!(
            kind = %context.kind,
            slug = %context.slug,
            provider = self.backend.provider_name(),
            model = self.backend.model_name(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Draft synthesized"
        );

        context.prompt = Some(prompt);
        Ok(Synthesis {
            draft,
            context,
            info: GenerationInfo {
                provider: self.backend.provider_name().to_string(),
                model: self.backend.model_name().to_string(),
                generated_at: Utc::now(),
            },
        })
    }
}
