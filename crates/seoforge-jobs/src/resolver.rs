//! Look a document up by whatever identifier a caller has.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::debug;

use seoforge_core::{ContentHost, DocumentLookup, PopulateSpec, PublicationStatus, Result};

static DOCUMENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9]{8,}$").expect("valid regex"));

pub fn is_document_id(identifier: &str) -> bool {
    DOCUMENT_ID.is_match(identifier)
}

/// Integer whose canonical form is exactly `identifier` (after trimming).
pub fn numeric_id(identifier: &str) -> Option<i64> {
    let trimmed = identifier.trim();
    let id: i64 = trimmed.parse().ok()?;
    (id.to_string() == trimmed).then_some(id)
}

/// Lookups to try for `identifier`, in order. The slug lookup is always last.
pub fn classify_identifier(identifier: &str) -> Vec<DocumentLookup> {
    let mut lookups = Vec::with_capacity(3);
    if is_document_id(identifier) {
        lookups.push(DocumentLookup::DocumentId(identifier.to_string()));
    }
    if let Some(id) = numeric_id(identifier) {
        lookups.push(DocumentLookup::NumericId(id));
    }
    lookups.push(DocumentLookup::Slug(identifier.to_string()));
    lookups
}

/// Resolve `identifier` to a document: by document id, then numeric id, then
/// slug.
///
/// A failed numeric-id lookup is logged and skipped. A document found by
/// numeric id without a `documentId` gets one attached from a slug lookup.
pub async fn resolve_document(
    host: &dyn ContentHost,
    model_uid: &str,
    identifier: &str,
    status: PublicationStatus,
    populate: &PopulateSpec,
) -> Result<Option<JsonValue>> {
    if identifier.trim().is_empty() {
        return Ok(None);
    }

    for lookup in classify_identifier(identifier) {
        let found = match &lookup {
            DocumentLookup::NumericId(_) => {
                match host.find_document(model_uid, &lookup, status, populate).await {
                    Ok(found) => found.map(|entry| (entry, true)),
                    Err(e) => {
                        debug!(model_uid, %lookup, error = %e, "Numeric lookup failed");
                        None
                    }
                }
            }
            _ => host
                .find_document(model_uid, &lookup, status, populate)
                .await?
                .map(|entry| (entry, false)),
        };

        if let Some((entry, by_numeric_id)) = found {
            debug!(model_uid, %lookup, "Document resolved");
            if by_numeric_id {
                return Ok(Some(attach_document_id(host, model_uid, entry, status).await));
            }
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

async fn attach_document_id(
    host: &dyn ContentHost,
    model_uid: &str,
    mut entry: JsonValue,
    status: PublicationStatus,
) -> JsonValue {
    if entry.get("documentId").is_some_and(|id| !id.is_null()) {
        return entry;
    }
    let Some(slug) = entry.get("slug").and_then(JsonValue::as_str).map(str::to_string) else {
        return entry;
    };

    let lookup = DocumentLookup::Slug(slug);
    match host
        .find_document(model_uid, &lookup, status, &PopulateSpec::new())
        .await
    {
        Ok(Some(doc)) => {
            if let (Some(document_id), Some(object)) = (doc.get("documentId"), entry.as_object_mut()) {
                if !document_id.is_null() {
                    object.insert("documentId".to_string(), document_id.clone());
                }
            }
        }
        Ok(None) => {}
        Err(e) => debug!(model_uid, error = %e, "Attaching documentId failed"),
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_host::MemoryHost;
    use serde_json::json;

    const UID: &str = "api::article.article";

    #[test]
    fn test_document_id_pattern() {
        assert!(is_document_id("abcd1234"));
        assert!(is_document_id("ABCDefgh99"));
        assert!(!is_document_id("abc123"));
        assert!(!is_document_id("with-dash-123"));
    }

    #[test]
    fn test_numeric_id_requires_canonical_form() {
        assert_eq!(numeric_id("42"), Some(42));
        assert_eq!(numeric_id(" 42 "), Some(42));
        assert_eq!(numeric_id("042"), None);
        assert_eq!(numeric_id("4.2"), None);
        assert_eq!(numeric_id("+42"), None);
    }

    #[test]
    fn test_classification_order() {
        assert_eq!(
            classify_identifier("12345678"),
            vec![
                DocumentLookup::DocumentId("12345678".into()),
                DocumentLookup::NumericId(12345678),
                DocumentLookup::Slug("12345678".into()),
            ]
        );
        assert_eq!(
            classify_identifier("my-post"),
            vec![DocumentLookup::Slug("my-post".into())]
        );
    }

    fn host() -> MemoryHost {
        MemoryHost::new().with_documents(
            UID,
            vec![
                json!({"id": 7, "documentId": "post0007abc", "slug": "seven"}),
                json!({"id": 8, "slug": "eight"}),
            ],
        )
    }

    #[tokio::test]
    async fn test_resolve_by_each_identifier() {
        let host = host();
        let spec = PopulateSpec::new();
        let status = PublicationStatus::Published;

        for identifier in ["post0007abc", "7", "seven"] {
            let found = resolve_document(&host, UID, identifier, status, &spec)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(found["slug"], "seven", "identifier {}", identifier);
        }
        assert!(resolve_document(&host, UID, "nothing", status, &spec)
            .await
            .unwrap()
            .is_none());
        assert!(resolve_document(&host, UID, "  ", status, &spec)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_numeric_lookup_without_document_id_stays_usable() {
        let host = host();
        let found = resolve_document(&host, UID, "8", PublicationStatus::Draft, &PopulateSpec::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["slug"], "eight");
        assert!(found.get("documentId").is_none());
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let host = host().failing_queries_for(UID);
        let result =
            resolve_document(&host, UID, "seven", PublicationStatus::Draft, &PopulateSpec::new())
                .await;
        assert!(result.is_err());
    }
}
