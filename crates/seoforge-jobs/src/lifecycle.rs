//! Host lifecycle events and publish detection.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use seoforge_core::PublicationStatus;

/// Parameters of the write that triggered an event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LifecycleParams {
    /// Fields written by the operation.
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "where")]
    pub filter: JsonValue,
}

/// An after-create or after-update notification from the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub model_uid: String,
    #[serde(default)]
    pub params: LifecycleParams,
    /// Document as stored after the operation.
    #[serde(default)]
    pub result: JsonValue,
    /// Document state before the operation.
    #[serde(default)]
    pub state: JsonValue,
}

impl LifecycleEvent {
    pub fn new(model_uid: impl Into<String>, result: JsonValue) -> Self {
        Self {
            model_uid: model_uid.into(),
            result,
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.params.data = data;
        self
    }

    pub fn with_state(mut self, state: JsonValue) -> Self {
        self.state = state;
        self
    }
}

fn is_set(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) | Some(JsonValue::Bool(false)) => false,
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Whether the event publishes the document.
///
/// The result must carry `publishedAt`. A first publication always counts.
/// For an already published document the write must set `publishedAt`
/// explicitly (a `null` there is an unpublish) or set `status` to
/// `published`.
pub fn is_publishing_event(event: &LifecycleEvent) -> bool {
    if !is_set(event.result.get("publishedAt")) {
        return false;
    }
    if !is_set(event.state.get("publishedAt")) {
        return true;
    }
    if let Some(published_at) = event.params.data.get("publishedAt") {
        return is_set(Some(published_at));
    }
    event.params.data.get("status").and_then(JsonValue::as_str) == Some("published")
}

/// Publication status the event refers to.
///
/// Explicit statuses are read from the written data, the call parameters and
/// the result, in that order; unparseable values are skipped.
pub fn status_from_event(event: &LifecycleEvent) -> PublicationStatus {
    let explicit = [
        event.params.data.get("status").and_then(JsonValue::as_str),
        event.params.status.as_deref(),
        event.result.get("status").and_then(JsonValue::as_str),
    ];
    explicit
        .into_iter()
        .flatten()
        .find_map(|s| s.parse().ok())
        .unwrap_or_else(|| {
            if is_set(event.result.get("publishedAt")) {
                PublicationStatus::Published
            } else {
                PublicationStatus::Draft
            }
        })
}

/// Document id of the event: the result's `documentId`, its `id`, or the
/// write filter's `documentId`.
pub fn document_id_of(event: &LifecycleEvent) -> Option<String> {
    [
        event.result.get("documentId"),
        event.result.get("id"),
        event.params.filter.get("documentId"),
    ]
    .into_iter()
    .flatten()
    .find_map(|value| match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
