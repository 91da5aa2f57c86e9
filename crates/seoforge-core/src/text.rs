//! Text sanitation helpers: length clamps, keyword lists, whitespace.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::defaults;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value, " ").trim().to_string()
}

/// Trim and clamp `value` to `max` characters, marker included.
///
/// Returns `None` for blank input. When a cut is needed it backs off to the
/// previous word boundary if one exists in the second half of the kept
/// text, trims trailing whitespace and appends [`defaults::ELLIPSIS`].
pub fn truncate(value: &str, max: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= max {
        return Some(trimmed.to_string());
    }

    let marker_len = defaults::ELLIPSIS.chars().count();
    let budget = max.saturating_sub(marker_len);
    let kept: String = trimmed.chars().take(budget).collect();

    let next_is_boundary = trimmed
        .chars()
        .nth(budget)
        .map(char::is_whitespace)
        .unwrap_or(true);
    let kept = if next_is_boundary {
        kept.as_str()
    } else {
        match kept.rfind(char::is_whitespace) {
            Some(idx) if kept[..idx].chars().count() >= budget / 2 => &kept[..idx],
            _ => kept.as_str(),
        }
    };

    Some(format!("{}{}", kept.trim_end(), defaults::ELLIPSIS))
}

/// [`truncate`] over an optional value.
pub fn truncate_opt(value: Option<&str>, max: usize) -> Option<String> {
    value.and_then(|v| truncate(v, max))
}

/// Trimmed, non-empty, case-insensitively unique strings in first-seen order.
pub fn unique_strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        let normalized = item.as_ref().trim();
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.to_lowercase()) {
            result.push(normalized.to_string());
        }
    }
    result
}

/// Keywords from an array of strings or a comma-separated string.
///
/// A string holding a JSON array (as hosts store JSON columns) is decoded
/// first. Anything else yields an empty list.
pub fn keyword_list(value: Option<&JsonValue>) -> Vec<String> {
    match value {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::String(s) => Some(s.trim().to_string()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(JsonValue::String(s)) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                if let Ok(parsed @ JsonValue::Array(_)) = serde_json::from_str(trimmed) {
                    return keyword_list(Some(&parsed));
                }
            }
            split_keywords(trimmed)
        }
        _ => Vec::new(),
    }
}

/// Split a comma-separated keyword string.
pub fn split_keywords(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join unique keywords with `", "`, dropping whole keywords that would push
/// the result past [`defaults::META_KEYWORDS_MAX`]. `None` when empty.
pub fn format_keywords(keywords: &[String]) -> Option<String> {
    let mut joined = String::new();
    for keyword in unique_strings(keywords) {
        let extra = if joined.is_empty() { 0 } else { 2 };
        if joined.chars().count() + extra + keyword.chars().count() > defaults::META_KEYWORDS_MAX {
            break;
        }
        if !joined.is_empty() {
            joined.push_str(", ");
        }
        joined.push_str(&keyword);
    }
    (!joined.is_empty()).then_some(joined)
}

/// Numeric value of a JSON number or numeric string.
pub fn as_number(value: Option<&JsonValue>) -> Option<f64> {
    let number = match value? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Non-blank trimmed string of a JSON value.
pub fn as_text(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_short_value_unchanged() {
        assert_eq!(truncate("  Grand Opening ", 70).as_deref(), Some("Grand Opening"));
        assert_eq!(truncate("   ", 70), None);
    }

    #[test]
    fn test_truncate_respects_limit_with_marker() {
        let long = "word ".repeat(40);
        let result = truncate(&long, 70).unwrap();
        assert!(result.chars().count() <= 70);
        assert!(result.ends_with("..."));
        assert!(!result.contains(" ..."));
    }

    #[test]
    fn test_truncate_backs_off_to_word_boundary() {
        let value = "Modern workshop spaces for creative teams in the heart of Berlin Mitte district";
        let result = truncate(value, 40).unwrap();
        assert_eq!(result, "Modern workshop spaces for creative...");
    }

    #[test]
    fn test_truncate_unbroken_text_cuts_hard() {
        let value = "x".repeat(100);
        let result = truncate(&value, 70).unwrap();
        assert_eq!(result.chars().count(), 70);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let value = "ä".repeat(80);
        let result = truncate(&value, 70).unwrap();
        assert_eq!(result.chars().count(), 70);
    }

    #[test]
    fn test_unique_strings_case_insensitive() {
        let result = unique_strings(["SEO", "seo", " Content ", "", "content", "Berlin"]);
        assert_eq!(result, vec!["SEO", "Content", "Berlin"]);
    }

    #[test]
    fn test_keyword_list_shapes() {
        assert_eq!(keyword_list(Some(&json!(["a", " b ", ""]))), vec!["a", "b"]);
        assert_eq!(keyword_list(Some(&json!("a, b,,c"))), vec!["a", "b", "c"]);
        assert_eq!(keyword_list(Some(&json!("[\"x\",\"y\"]"))), vec!["x", "y"]);
        assert!(keyword_list(Some(&json!({"a": 1}))).is_empty());
        assert!(keyword_list(None).is_empty());
    }

    #[test]
    fn test_format_keywords_bounds_length() {
        let keywords: Vec<String> = (0..100).map(|i| format!("keyword-{}", i)).collect();
        let joined = format_keywords(&keywords).unwrap();
        assert!(joined.chars().count() <= 255);
        assert!(joined.starts_with("keyword-0, keyword-1"));
        assert!(!joined.ends_with(", "));
        assert_eq!(format_keywords(&[]), None);
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(Some(&json!(0.5))), Some(0.5));
        assert_eq!(as_number(Some(&json!("0.7"))), Some(0.7));
        assert_eq!(as_number(Some(&json!("high"))), None);
        assert_eq!(as_number(Some(&json!(null))), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
