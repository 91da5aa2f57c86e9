//! Backfill sweep: synthesize records for entities published without one.
//!
//! A sweep walks every target in order, fetches up to `batch_size` entries
//! whose record lacks a title or description and synthesizes each one. A
//! failing query or entity is logged and the sweep moves on.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};
use uuid::Uuid;

use seoforge_core::{ContentKind, ContentTarget, PublicationStatus};

use crate::inflight::SynthesisKey;
use crate::service::{SeoService, SynthesisOutcome};

/// A content target as the sweep sees it.
#[derive(Debug, Clone)]
pub struct BackfillTarget {
    pub target: ContentTarget,
    /// Entity attribute used as share image when the record has none.
    pub fallback_image_field: Option<&'static str>,
}

pub const BACKFILL_TARGETS: &[BackfillTarget] = &[
    BackfillTarget {
        target: ContentTarget {
            model_uid: "api::page.page",
            kind: ContentKind::Page,
            label: "page",
        },
        fallback_image_field: None,
    },
    BackfillTarget {
        target: ContentTarget {
            model_uid: "api::article.article",
            kind: ContentKind::News,
            label: "news article",
        },
        fallback_image_field: Some("blogimage"),
    },
    BackfillTarget {
        target: ContentTarget {
            model_uid: "api::event.event",
            kind: ContentKind::Event,
            label: "event",
        },
        fallback_image_field: Some("heroImage"),
    },
];

/// Entity the sweep could not update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillFailure {
    pub model_uid: String,
    /// `None` when the target query itself failed.
    pub document_id: Option<String>,
    pub reason: String,
}

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackfillReport {
    pub run_id: Uuid,
    /// False when the sweep was switched off and nothing ran.
    pub enabled: bool,
    /// Entities fetched across all targets.
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failures: Vec<BackfillFailure>,
    pub duration_ms: u64,
}

impl BackfillReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            enabled: true,
            ..Default::default()
        }
    }

    fn fail(&mut self, model_uid: &str, document_id: Option<&str>, reason: impl Into<String>) {
        self.failures.push(BackfillFailure {
            model_uid: model_uid.to_string(),
            document_id: document_id.map(str::to_string),
            reason: reason.into(),
        });
    }
}

pub(crate) async fn sweep(service: &SeoService) -> BackfillReport {
    let mut report = BackfillReport::new();
    let config = &service.config().backfill;
    if !config.enabled {
        info!(run_id = %report.run_id, "SEO backfill disabled");
        report.enabled = false;
        return report;
    }

    let started = Instant::now();
    let batch_size = config.batch_size.max(1);
    for target in BACKFILL_TARGETS {
        sweep_target(service, target, batch_size, &mut report).await;
    }
    report.duration_ms = started.elapsed().as_millis() as u64;

    info!(
        run_id = %report.run_id,
        processed = report.processed,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failures.len(),
        duration_ms = report.duration_ms,
        "SEO backfill finished"
    );
    report
}

async fn sweep_target(
    service: &SeoService,
    backfill: &BackfillTarget,
    batch_size: usize,
    report: &mut BackfillReport,
) {
    let target = &backfill.target;
    let populate = service.populate_for(target.model_uid);
    let entries = match service
        .host()
        .find_missing_seo(target.model_uid, batch_size, &populate)
        .await
    {
        Ok(entries) => entries,
        Err(e) => {
            error!(model_uid = target.model_uid, error = %e, "SEO backfill query failed");
            report.fail(target.model_uid, None, e.to_string());
            return;
        }
    };

    for entry in entries {
        report.processed += 1;
        let Some(document_id) = entry
            .get("documentId")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
        else {
            warn!(
                model_uid = target.model_uid,
                id = %entry.get("id").unwrap_or(&JsonValue::Null),
                "Skipping entry without documentId"
            );
            report.skipped += 1;
            continue;
        };

        let status = PublicationStatus::Published;
        let key = SynthesisKey::new(target.model_uid, document_id.clone(), status);
        let Some(_guard) = service.inflight().try_acquire(key) else {
            warn!(model_uid = target.model_uid, %document_id, "Skipping entry already in flight");
            report.skipped += 1;
            continue;
        };

        let fallback = backfill
            .fallback_image_field
            .and_then(|field| entry.get(field));
        match service
            .synthesize_and_store(target, &document_id, status, &entry, fallback)
            .await
        {
            SynthesisOutcome::Updated(_) => report.updated += 1,
            SynthesisOutcome::Skipped(reason) => {
                warn!(model_uid = target.model_uid, %document_id, reason = reason.as_str(), "Skipped entry");
                report.skipped += 1;
            }
            SynthesisOutcome::GenerationFailed(failure) => {
                report.fail(target.model_uid, Some(&document_id), failure.to_string());
            }
            SynthesisOutcome::HostFailed(message) => {
                report.fail(target.model_uid, Some(&document_id), message);
            }
        }
    }
}
