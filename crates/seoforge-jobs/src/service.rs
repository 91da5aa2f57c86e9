//! Orchestration facade: synthesis on publish, backfill, rendering.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use seoforge_core::{
    clamp_depth, render_seo_meta, Clock, ContentHost, ContentKind, ContentTarget,
    GenerationBackend, GenerationFailure, GlobalDefaults, PopulateSpec, PopulateTreeBuilder,
    PublicationStatus, Result, SchemaRegistry, SeoConfig, SeoContextBuilder, SeoMeta,
    SeoPayloadMerger, SeoRecord, SystemClock,
};
use seoforge_inference::AiMetadataSynthesizer;

use crate::backfill::{self, BackfillReport};
use crate::defaults_cache::GlobalDefaultsCache;
use crate::inflight::{InFlightRegistry, SynthesisKey};
use crate::lifecycle::{document_id_of, is_publishing_event, status_from_event, LifecycleEvent};
use crate::resolver::resolve_document;

/// Why a synthesis request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Generation switched off by configuration.
    Disabled,
    NotPublishing,
    /// Model is not a content target.
    UnsupportedModel,
    MissingDocumentId,
    /// Same document and status already being synthesized.
    InFlight,
    NotFound,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NotPublishing => "not_publishing",
            Self::UnsupportedModel => "unsupported_model",
            Self::MissingDocumentId => "missing_document_id",
            Self::InFlight => "in_flight",
            Self::NotFound => "not_found",
        }
    }
}

/// Result of one synthesis request. Failures are values so a sweep can
/// continue past them.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    Updated(Box<SeoRecord>),
    Skipped(SkipReason),
    GenerationFailed(GenerationFailure),
    /// The host rejected a read or the update; the prior record is intact.
    HostFailed(String),
}

impl SynthesisOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// Stable tag for logs and reports.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Updated(_) => "updated",
            Self::Skipped(reason) => reason.as_str(),
            Self::GenerationFailed(failure) => failure.reason(),
            Self::HostFailed(_) => "host",
        }
    }
}

/// Wires the host, the synthesizer, the in-flight registry and the defaults
/// cache together.
pub struct SeoService {
    config: SeoConfig,
    host: Arc<dyn ContentHost>,
    synthesizer: AiMetadataSynthesizer,
    schema: Arc<SchemaRegistry>,
    inflight: InFlightRegistry,
    defaults: GlobalDefaultsCache,
    clock: Arc<dyn Clock>,
}

impl SeoService {
    pub fn new(
        config: SeoConfig,
        host: Arc<dyn ContentHost>,
        backend: Arc<dyn GenerationBackend>,
        schema: Arc<SchemaRegistry>,
    ) -> Self {
        let contexts = SeoContextBuilder::new(config.context.clone(), config.base_paths.clone());
        let synthesizer = AiMetadataSynthesizer::new(backend, config.generation.clone(), contexts);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            defaults: GlobalDefaultsCache::with_clock(config.cache_ttl, clock.clone()),
            config,
            host,
            synthesizer,
            schema,
            inflight: InFlightRegistry::new(),
            clock,
        }
    }

    /// Use `clock` for cache staleness and generation timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.defaults = GlobalDefaultsCache::with_clock(self.config.cache_ttl, clock.clone());
        self.clock = clock;
        self
    }

    /// Share an in-flight registry with other services in the process.
    pub fn with_inflight(mut self, inflight: InFlightRegistry) -> Self {
        self.inflight = inflight;
        self
    }

    pub fn config(&self) -> &SeoConfig {
        &self.config
    }

    pub fn host(&self) -> &dyn ContentHost {
        self.host.as_ref()
    }

    pub fn inflight(&self) -> &InFlightRegistry {
        &self.inflight
    }

    /// Populate spec for `model_uid` at the default depth.
    pub fn populate_for(&self, model_uid: &str) -> PopulateSpec {
        let spec = PopulateTreeBuilder::new(self.schema.as_ref()).build(model_uid, clamp_depth(None));
        debug!(model_uid, attributes = spec.len(), depth = spec.depth(), "Populate spec built");
        spec
    }

    pub async fn global_defaults(&self) -> GlobalDefaults {
        self.defaults.get(self.host.as_ref()).await
    }

    /// Generate a draft for `entity` and merge it with the entity's stored
    /// record and the global defaults. Nothing is persisted.
    pub async fn synthesize_record(
        &self,
        entity: &JsonValue,
        kind: ContentKind,
        label: &str,
    ) -> std::result::Result<SeoRecord, GenerationFailure> {
        let site_url = self.config.effective_site_url();
        let synthesis = self
            .synthesizer
            .synthesize(entity, kind, label, site_url.as_deref())
            .await?;

        let existing = SeoRecord::from_entity(entity);
        let global = self.global_defaults().await;
        let mut info = synthesis.info;
        info.generated_at = self.clock.now();

        Ok(SeoPayloadMerger::new(self.config.context.locale.clone())
            .with_generation(info)
            .merge(&synthesis.draft, existing.as_ref(), &global, &synthesis.context))
    }

    /// Synthesize and persist the record of one fetched document. The caller
    /// holds the in-flight key.
    pub(crate) async fn synthesize_and_store(
        &self,
        target: &ContentTarget,
        document_id: &str,
        status: PublicationStatus,
        entity: &JsonValue,
        fallback_image: Option<&JsonValue>,
    ) -> SynthesisOutcome {
        let mut record = match self.synthesize_record(entity, target.kind, target.label).await {
            Ok(record) => record,
            Err(failure) => {
                warn!(
                    model_uid = target.model_uid,
                    document_id,
                    reason = failure.reason(),
                    "SEO generation failed: {}",
                    failure
                );
                return SynthesisOutcome::GenerationFailed(failure);
            }
        };

        if record.share_image.is_none() {
            record.share_image = fallback_image.filter(|image| !image.is_null()).cloned();
        }

        if let Err(e) = self
            .host
            .update_seo(target.model_uid, document_id, status, &record)
            .await
        {
            error!(model_uid = target.model_uid, document_id, error = %e, "Failed to store SEO record");
            return SynthesisOutcome::HostFailed(e.to_string());
        }

        let assistant = record.ai_assistant.as_ref();
        info!(
            model_uid = target.model_uid,
            document_id,
            %status,
            provider = assistant.and_then(|a| a.provider.as_deref()).unwrap_or_default(),
            model = assistant.and_then(|a| a.model.as_deref()).unwrap_or_default(),
            "Updated SEO record"
        );
        SynthesisOutcome::Updated(Box::new(record))
    }

    /// React to a host lifecycle event: on publish of a content target,
    /// regenerate and store its SEO record.
    pub async fn handle_lifecycle(&self, event: &LifecycleEvent) -> SynthesisOutcome {
        if !self.config.generation.enabled {
            return SynthesisOutcome::Skipped(SkipReason::Disabled);
        }
        if !is_publishing_event(event) {
            return SynthesisOutcome::Skipped(SkipReason::NotPublishing);
        }
        let Some(target) = ContentTarget::lookup(&event.model_uid) else {
            return SynthesisOutcome::Skipped(SkipReason::UnsupportedModel);
        };
        let Some(document_id) = document_id_of(event) else {
            return SynthesisOutcome::Skipped(SkipReason::MissingDocumentId);
        };
        let status = status_from_event(event);

        let key = SynthesisKey::new(target.model_uid, document_id.clone(), status);
        let Some(_guard) = self.inflight.try_acquire(key) else {
            debug!(model_uid = target.model_uid, %document_id, %status, "Synthesis already in flight");
            return SynthesisOutcome::Skipped(SkipReason::InFlight);
        };

        let populate = self.populate_for(target.model_uid);
        let entity = match resolve_document(
            self.host.as_ref(),
            target.model_uid,
            &document_id,
            status,
            &populate,
        )
        .await
        {
            Ok(Some(entity)) => entity,
            Ok(None) => return SynthesisOutcome::Skipped(SkipReason::NotFound),
            Err(e) => {
                error!(model_uid = target.model_uid, %document_id, error = %e, "Failed to load document");
                return SynthesisOutcome::HostFailed(e.to_string());
            }
        };

        self.synthesize_and_store(target, &document_id, status, &entity, None)
            .await
    }

    /// Run one backfill sweep over every content target.
    pub async fn run_backfill(&self) -> BackfillReport {
        backfill::sweep(self).await
    }

    /// Look up a document of `model_uid` by document id, numeric id or slug.
    pub async fn resolve(
        &self,
        model_uid: &str,
        identifier: &str,
        status: PublicationStatus,
    ) -> Result<Option<JsonValue>> {
        let populate = self.populate_for(model_uid);
        resolve_document(self.host.as_ref(), model_uid, identifier, status, &populate).await
    }

    /// Public metadata of `entity`.
    pub async fn render(
        &self,
        entity: &JsonValue,
        kind: ContentKind,
        fallback_image: Option<&JsonValue>,
    ) -> SeoMeta {
        let global = self.global_defaults().await;
        render_seo_meta(entity, kind, &global, &self.config, fallback_image)
    }
}
