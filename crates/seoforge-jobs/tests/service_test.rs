//! Integration tests for SeoService.
//!
//! This test suite validates:
//! - Synthesize-on-publish for lifecycle events
//! - At-most-one-concurrent synthesis per document and status
//! - Failure isolation: generation and persistence failures leave the
//!   stored record untouched and release the in-flight key
//! - Backfill sweeps continue past failing entities and targets
//!
//! All tests run against `MemoryHost` and `MockGenerationBackend`.

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use seoforge_inference::mock::MockGenerationBackend;
use seoforge_jobs::{
    GenerationFailure, LifecycleEvent, MemoryHost, PublicationStatus, SchemaRegistry, SeoConfig,
    SeoService, SkipReason, SynthesisOutcome,
};

const PAGE: &str = "api::page.page";
const ARTICLE: &str = "api::article.article";
const EVENT: &str = "api::event.event";

const DRAFT: &str = r#"{"metaTitle": "Generated title", "metaDescription": "Generated description for the page."}"#;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn config() -> SeoConfig {
    let mut config = SeoConfig::default().with_site_url("https://example.com");
    config.backfill.batch_size = 10;
    config
}

fn service(config: SeoConfig, host: Arc<MemoryHost>, mock: &MockGenerationBackend) -> SeoService {
    SeoService::new(
        config,
        host,
        Arc::new(mock.clone()),
        Arc::new(SchemaRegistry::new()),
    )
}

fn page_host() -> MemoryHost {
    MemoryHost::new().with_documents(
        PAGE,
        vec![json!({
            "id": 1,
            "documentId": "page0001about",
            "title": "About us",
            "slug": "about-us",
            "publishedAt": "2025-03-01T10:00:00Z",
            "seo": null
        })],
    )
}

fn publish_event(document_id: &str) -> LifecycleEvent {
    LifecycleEvent::new(
        PAGE,
        json!({"documentId": document_id, "publishedAt": "2025-03-01T10:00:00Z"}),
    )
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_publish_event_updates_record() {
    let host = Arc::new(page_host());
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let service = service(config(), host.clone(), &mock);

    let outcome = service.handle_lifecycle(&publish_event("page0001about")).await;

    let SynthesisOutcome::Updated(record) = outcome else {
        panic!("expected update, got {:?}", outcome);
    };
    assert_eq!(record.meta_title, "Generated title");

    let updates = host.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].document_id, "page0001about");
    assert_eq!(updates[0].status, PublicationStatus::Published);

    let stored = host.document(PAGE, "page0001about").unwrap();
    assert_eq!(stored["seo"]["metaTitle"], "Generated title");
    assert!(service.inflight().is_empty());
}

#[tokio::test]
async fn test_concurrent_events_synthesize_once() {
    let host = Arc::new(page_host());
    let mock = MockGenerationBackend::new()
        .with_fixed_response(DRAFT)
        .with_latency_ms(100);
    let service = service(config(), host.clone(), &mock);

    let event = publish_event("page0001about");
    let (first, second) = tokio::join!(
        service.handle_lifecycle(&event),
        service.handle_lifecycle(&event)
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|o| o.is_updated()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|o| *o == SynthesisOutcome::Skipped(SkipReason::InFlight)));
    assert_eq!(mock.generate_call_count(), 1);
    assert_eq!(host.updates().len(), 1);

    // Released after completion: the next publish runs again.
    assert!(service.handle_lifecycle(&event).await.is_updated());
    assert_eq!(mock.generate_call_count(), 2);
}

#[tokio::test]
async fn test_draft_and_published_versions_do_not_block_each_other() {
    let host = Arc::new(page_host());
    let mock = MockGenerationBackend::new()
        .with_fixed_response(DRAFT)
        .with_latency_ms(50);
    let service = service(config(), host.clone(), &mock);

    let published = publish_event("page0001about");
    let draft = publish_event("page0001about").with_data(json!({"status": "draft"}));
    let (a, b) = tokio::join!(
        service.handle_lifecycle(&published),
        service.handle_lifecycle(&draft)
    );

    assert!(a.is_updated());
    assert!(b.is_updated());
    let mut statuses: Vec<_> = host.updates().iter().map(|u| u.status).collect();
    statuses.sort_by_key(|s| s.as_str());
    assert_eq!(
        statuses,
        vec![PublicationStatus::Draft, PublicationStatus::Published]
    );
}

#[tokio::test]
async fn test_events_that_do_nothing() {
    let host = Arc::new(page_host());
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let service = service(config(), host.clone(), &mock);

    let draft_save = LifecycleEvent::new(PAGE, json!({"documentId": "page0001about", "publishedAt": null}));
    assert_eq!(
        service.handle_lifecycle(&draft_save).await,
        SynthesisOutcome::Skipped(SkipReason::NotPublishing)
    );

    let other_model = LifecycleEvent::new(
        "api::author.author",
        json!({"documentId": "auth0001xyz", "publishedAt": "2025-01-01"}),
    );
    assert_eq!(
        service.handle_lifecycle(&other_model).await,
        SynthesisOutcome::Skipped(SkipReason::UnsupportedModel)
    );

    let anonymous = LifecycleEvent::new(PAGE, json!({"publishedAt": "2025-01-01"}));
    assert_eq!(
        service.handle_lifecycle(&anonymous).await,
        SynthesisOutcome::Skipped(SkipReason::MissingDocumentId)
    );

    assert_eq!(
        service.handle_lifecycle(&publish_event("gone0000page")).await,
        SynthesisOutcome::Skipped(SkipReason::NotFound)
    );

    assert_eq!(mock.generate_call_count(), 0);
    assert!(host.updates().is_empty());
}

#[tokio::test]
async fn test_disabled_generation_skips_everything() {
    let host = Arc::new(page_host());
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let mut config = config();
    config.generation.enabled = false;
    let service = service(config, host.clone(), &mock);

    assert_eq!(
        service.handle_lifecycle(&publish_event("page0001about")).await,
        SynthesisOutcome::Skipped(SkipReason::Disabled)
    );
    assert_eq!(mock.generate_call_count(), 0);
}

#[tokio::test]
async fn test_generation_failure_keeps_prior_record() {
    let host = Arc::new(page_host());
    let failure = GenerationFailure::Transport {
        status: 429,
        message: "Rate limit reached".into(),
    };
    let mock = MockGenerationBackend::new().with_failure(failure.clone());
    let service = service(config(), host.clone(), &mock);

    let outcome = service.handle_lifecycle(&publish_event("page0001about")).await;

    assert_eq!(outcome, SynthesisOutcome::GenerationFailed(failure));
    assert_eq!(outcome.reason(), "transport");
    assert!(host.updates().is_empty());
    assert_eq!(host.document(PAGE, "page0001about").unwrap()["seo"], JsonValue::Null);
    assert!(service.inflight().is_empty());
}

#[tokio::test]
async fn test_rejected_update_is_reported() {
    let host = Arc::new(page_host().failing_updates_for("page0001about"));
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let service = service(config(), host.clone(), &mock);

    let outcome = service.handle_lifecycle(&publish_event("page0001about")).await;

    assert!(matches!(outcome, SynthesisOutcome::HostFailed(_)));
    assert!(service.inflight().is_empty());
}

#[tokio::test]
async fn test_existing_record_fields_survive_regeneration() {
    let host = Arc::new(MemoryHost::new().with_documents(
        PAGE,
        vec![json!({
            "documentId": "page0002kept",
            "title": "Pricing",
            "slug": "pricing",
            "seo": {
                "metaTitle": "Pricing",
                "metaDescription": "Plans and prices",
                "canonicalUrl": "https://example.com/custom-pricing"
            }
        })],
    ));
    let mock = MockGenerationBackend::new().with_fixed_response(r#"{"metaDescription": "Fresh description."}"#);
    let service = service(config(), host.clone(), &mock);

    let SynthesisOutcome::Updated(record) =
        service.handle_lifecycle(&publish_event("page0002kept")).await
    else {
        panic!("expected update");
    };
    assert_eq!(record.meta_title, "Pricing");
    assert_eq!(record.meta_description, "Fresh description.");
    assert_eq!(
        record.canonical_url.as_deref(),
        Some("https://example.com/custom-pricing")
    );
}

// ============================================================================
// BACKFILL
// ============================================================================

fn backfill_host() -> MemoryHost {
    MemoryHost::new()
        .with_documents(
            PAGE,
            vec![
                json!({"id": 1, "documentId": "page0001about", "title": "About", "slug": "about-us", "seo": null}),
                json!({"id": 2, "documentId": "page0002done", "slug": "contact",
                       "seo": {"metaTitle": "Contact", "metaDescription": "Reach us"}}),
                json!({"id": 3, "title": "Orphan", "slug": "orphan", "seo": null}),
            ],
        )
        .with_documents(
            ARTICLE,
            vec![
                json!({"id": 10, "documentId": "art00001news", "title": "Broken", "slug": "broken-story"}),
                json!({"id": 11, "documentId": "art00002news", "title": "Launch", "slug": "launch-day",
                       "blogimage": {"url": "/uploads/launch.jpg"}}),
            ],
        )
        .with_documents(
            EVENT,
            vec![
                json!({"id": 20, "documentId": "evt00001gala", "title": "Gala", "slug": "gala",
                       "heroImage": {"url": "/uploads/gala.jpg"}}),
                json!({"id": 21, "documentId": "evt00002fail", "title": "Fair", "slug": "fair"}),
            ],
        )
        .failing_updates_for("evt00002fail")
}

#[tokio::test]
async fn test_backfill_continues_past_failures() {
    let host = Arc::new(backfill_host());
    let mock = MockGenerationBackend::new()
        .with_fixed_response(DRAFT)
        .with_failure_for(
            "broken-story",
            GenerationFailure::InvalidResponse("not json".into()),
        );
    let service = service(config(), host.clone(), &mock);

    let report = service.run_backfill().await;

    assert!(report.enabled);
    assert_eq!(report.processed, 6);
    assert_eq!(report.updated, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures.len(), 2);
    let failed: Vec<_> = report
        .failures
        .iter()
        .filter_map(|f| f.document_id.as_deref())
        .collect();
    assert_eq!(failed, vec!["art00001news", "evt00002fail"]);

    let updated: Vec<_> = host.updates().into_iter().map(|u| u.document_id).collect();
    assert_eq!(updated, vec!["page0001about", "art00002news", "evt00001gala"]);
    assert!(host
        .updates()
        .iter()
        .all(|u| u.status == PublicationStatus::Published));
    assert!(service.inflight().is_empty());
}

#[tokio::test]
async fn test_backfill_uses_fallback_share_images() {
    let host = Arc::new(backfill_host());
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let service = service(config(), host.clone(), &mock);

    service.run_backfill().await;

    let page = host.document(PAGE, "page0001about").unwrap();
    assert!(page["seo"].get("shareImage").is_none());

    let article = host.document(ARTICLE, "art00002news").unwrap();
    assert_eq!(article["seo"]["shareImage"], json!({"url": "/uploads/launch.jpg"}));

    let event = host.document(EVENT, "evt00001gala").unwrap();
    assert_eq!(event["seo"]["shareImage"], json!({"url": "/uploads/gala.jpg"}));
}

#[tokio::test]
async fn test_backfill_keeps_human_fields_of_records_with_nulls() {
    let host = Arc::new(MemoryHost::new().with_documents(
        EVENT,
        vec![json!({
            "id": 22,
            "documentId": "evt00003expo",
            "title": "Expo",
            "slug": "expo",
            "heroImage": {"url": "/uploads/expo-hero.jpg"},
            "seo": {
                "id": 40,
                "metaTitle": "Spring Expo",
                "metaDescription": null,
                "metaKeywords": null,
                "canonicalUrl": "https://example.com/events/spring-expo",
                "shareImage": {"id": 8, "url": "/uploads/expo-share.jpg"},
                "shareImageAlt": null,
                "structuredData": null,
                "metaSocial": [
                    {"id": 3, "socialNetwork": "facebook", "title": null, "image": {"id": 9}}
                ]
            }
        })],
    ));
    let mock = MockGenerationBackend::new()
        .with_fixed_response(r#"{"metaDescription": "Three days of exhibitors."}"#);
    let service = service(config(), host.clone(), &mock);

    let report = service.run_backfill().await;
    assert_eq!(report.updated, 1);

    let seo = host.document(EVENT, "evt00003expo").unwrap()["seo"].clone();
    assert_eq!(seo["metaTitle"], "Spring Expo");
    assert_eq!(seo["metaDescription"], "Three days of exhibitors.");
    assert_eq!(seo["canonicalUrl"], "https://example.com/events/spring-expo");
    assert_eq!(seo["shareImage"], json!({"id": 8, "url": "/uploads/expo-share.jpg"}));
    assert_eq!(seo["metaSocial"][0]["socialNetwork"], "facebook");
    assert_eq!(seo["metaSocial"][0]["image"], json!({"id": 9}));
}

#[tokio::test]
async fn test_backfill_sweeps_articles_as_news() {
    let host = Arc::new(backfill_host());
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let service = service(config(), host.clone(), &mock);

    service.run_backfill().await;

    let launch_prompt = mock
        .get_calls()
        .into_iter()
        .find(|call| call.prompt.contains("launch-day"))
        .unwrap()
        .prompt;
    assert!(launch_prompt.contains("news article"));
}

#[tokio::test]
async fn test_backfill_query_failure_skips_only_that_target() {
    let host = Arc::new(backfill_host().failing_queries_for(ARTICLE));
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let service = service(config(), host.clone(), &mock);

    let report = service.run_backfill().await;

    let query_failures: Vec<_> = report
        .failures
        .iter()
        .filter(|f| f.document_id.is_none())
        .map(|f| f.model_uid.as_str())
        .collect();
    assert_eq!(query_failures, vec![ARTICLE]);
    assert_eq!(report.updated, 2);
}

#[tokio::test]
async fn test_backfill_respects_batch_size() {
    let host = Arc::new(backfill_host());
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let mut config = config();
    config.backfill.batch_size = 1;
    let service = service(config, host.clone(), &mock);

    let report = service.run_backfill().await;

    assert_eq!(report.processed, 3);
    assert_eq!(mock.generate_call_count(), 3);
}

#[tokio::test]
async fn test_disabled_backfill_does_nothing() {
    let host = Arc::new(backfill_host());
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let mut config = config();
    config.backfill.enabled = false;
    let service = service(config, host.clone(), &mock);

    let report = service.run_backfill().await;

    assert!(!report.enabled);
    assert_eq!(report.processed, 0);
    assert_eq!(mock.generate_call_count(), 0);
}

#[tokio::test]
async fn test_backfill_fetches_global_defaults_once() {
    let host = Arc::new(backfill_host());
    let mock = MockGenerationBackend::new().with_fixed_response(DRAFT);
    let service = service(config(), host.clone(), &mock);

    service.run_backfill().await;

    assert_eq!(host.global_fetch_count(), 1);
}
