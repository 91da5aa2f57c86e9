//! Media normalization: raw host media records into compact public descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::text;
use crate::url::is_absolute;

/// Compact public view of a media file. Absent fields are omitted on
/// serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    /// Always absolute.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Normalize a raw media record.
///
/// The URL is taken from `url`, then `formats.large.url`, then
/// `formats.medium.url`; relative URLs are prefixed with `backend_base_url`.
/// Returns `None` when the record is missing or has no usable URL.
pub fn normalize(record: Option<&JsonValue>, backend_base_url: &str) -> Option<MediaDescriptor> {
    let record = record?.as_object()?;

    let url = text::as_text(record.get("url"))
        .or_else(|| format_url(record, "large"))
        .or_else(|| format_url(record, "medium"))?;

    let url = if is_absolute(&url) {
        url
    } else if url.starts_with('/') {
        format!("{}{}", backend_base_url.trim_end_matches('/'), url)
    } else {
        format!("{}/{}", backend_base_url.trim_end_matches('/'), url)
    };

    Some(MediaDescriptor {
        id: record.get("id").filter(|id| !id.is_null()).cloned(),
        url,
        alternative_text: text::as_text(record.get("alternativeText"))
            .or_else(|| text::as_text(record.get("caption"))),
        width: positive(record.get("width")),
        height: positive(record.get("height")),
        mime: text::as_text(record.get("mime")),
        size: positive(record.get("size")),
        format: text::as_text(record.get("ext")),
        hash: text::as_text(record.get("hash")),
        name: text::as_text(record.get("name")),
    })
}

fn format_url(record: &Map<String, JsonValue>, size: &str) -> Option<String> {
    text::as_text(record.get("formats")?.get(size)?.get("url"))
}

fn positive(value: Option<&JsonValue>) -> Option<f64> {
    text::as_number(value).filter(|n| *n > 0.0)
}
