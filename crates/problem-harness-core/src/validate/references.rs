//! Identifier, storage-path, URL and slug format checks.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use uuid::Uuid;

static STORAGE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^r2://[a-z0-9-]+/[\w/.-]+$").expect("static regex"));
static SOURCE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[\w.-]+(?:/[\w./?%&=-]*)?$").expect("static regex")
});
static SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceErrorKind {
    MissingUuid,
    InvalidUuid,
    InvalidR2Path,
    InvalidUrl,
    MissingSlug,
    InvalidSlug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceError {
    #[serde(rename = "type")]
    pub error_type: ReferenceErrorKind,
    pub field: String,
    pub value: String,
    pub record_id: String,
    pub message: String,
}

/// `r2://bucket/path` with a lowercase bucket.
pub fn is_storage_path(path: &str) -> bool {
    STORAGE_PATH.is_match(path)
}

pub fn is_source_url(url: &str) -> bool {
    SOURCE_URL.is_match(url)
}

pub fn is_slug(slug: &str) -> bool {
    SLUG.is_match(slug)
}

fn text(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

fn problem_label(record: &Value) -> String {
    match record.get("problem_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Every record's `id_field` must be present and parse as a UUID.
pub fn validate_ids(records: &[Value], id_field: &str) -> Vec<ReferenceError> {
    records
        .iter()
        .filter_map(|record| {
            let value = record.get(id_field).filter(|v| match v {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                _ => true,
            });
            match value {
                None => Some(ReferenceError {
                    error_type: ReferenceErrorKind::MissingUuid,
                    field: id_field.to_string(),
                    value: String::new(),
                    record_id: "unknown".to_string(),
                    message: format!("Missing {}", id_field),
                }),
                Some(v) => {
                    let shown = text(v);
                    let valid = v.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok());
                    (!valid).then(|| ReferenceError {
                        error_type: ReferenceErrorKind::InvalidUuid,
                        field: id_field.to_string(),
                        message: format!("Invalid UUID format: {}", shown),
                        record_id: shown.clone(),
                        value: shown,
                    })
                }
            }
        })
        .collect()
}

/// Non-null `content_refs` paths must be storage paths.
pub fn validate_content_refs(problems: &[Value]) -> Vec<ReferenceError> {
    let mut errors = Vec::new();
    for problem in problems {
        let Some(refs) = problem.get("content_refs").and_then(Value::as_object) else {
            continue;
        };
        for (field, path) in refs {
            if path.is_null() || path.as_str().is_some_and(is_storage_path) {
                continue;
            }
            let shown = text(path);
            errors.push(ReferenceError {
                error_type: ReferenceErrorKind::InvalidR2Path,
                field: format!("content_refs.{}", field),
                message: format!("Invalid R2 path format: {}", shown),
                value: shown,
                record_id: problem_label(problem),
            });
        }
    }
    errors
}

/// `metadata.source_url`, when set, must be an http(s) URL.
pub fn validate_source_urls(problems: &[Value]) -> Vec<ReferenceError> {
    problems
        .iter()
        .filter_map(|problem| {
            let url = problem.pointer("/metadata/source_url")?.as_str()?;
            if url.is_empty() || is_source_url(url) {
                return None;
            }
            Some(ReferenceError {
                error_type: ReferenceErrorKind::InvalidUrl,
                field: "metadata.source_url".to_string(),
                value: url.to_string(),
                record_id: problem_label(problem),
                message: format!("Invalid URL format: {}", url),
            })
        })
        .collect()
}

/// Slugs must be non-empty lowercase alphanumerics and hyphens.
pub fn validate_slugs(problems: &[Value]) -> Vec<ReferenceError> {
    problems
        .iter()
        .filter_map(|problem| {
            let slug = problem.get("slug").and_then(Value::as_str).unwrap_or("");
            if slug.is_empty() {
                Some(ReferenceError {
                    error_type: ReferenceErrorKind::MissingSlug,
                    field: "slug".to_string(),
                    value: String::new(),
                    record_id: problem_label(problem),
                    message: "Missing slug".to_string(),
                })
            } else if !is_slug(slug) {
                Some(ReferenceError {
                    error_type: ReferenceErrorKind::InvalidSlug,
                    field: "slug".to_string(),
                    value: slug.to_string(),
                    record_id: problem_label(problem),
                    message: format!(
                        "Invalid slug format (must be lowercase, alphanumeric, hyphens): {}",
                        slug
                    ),
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patterns() {
        assert!(is_storage_path("r2://problems/leetcode/two-sum/description.md"));
        assert!(!is_storage_path("s3://problems/x"));
        assert!(!is_storage_path("r2://Problems/x"));
        assert!(!is_storage_path("r2://problems/"));
        assert!(is_source_url("https://codeforces.com/problemset/problem/100/A"));
        assert!(is_source_url("http://leetcode.com"));
        assert!(!is_source_url("ftp://leetcode.com/x"));
        assert!(!is_source_url("https://leetcode.com/a b"));
        assert!(is_slug("100-a-sum"));
        assert!(!is_slug("Two_Sum"));
    }

    #[test]
    fn test_missing_vs_invalid_ids() {
        let records = vec![
            json!({"problem_id": "7d0a3f8e-3f49-5b1c-9d8e-1a2b3c4d5e6f"}),
            json!({"problem_id": ""}),
            json!({}),
            json!({"problem_id": "nope"}),
            json!({"problem_id": 12}),
        ];
        let errors = validate_ids(&records, "problem_id");
        let kinds: Vec<ReferenceErrorKind> = errors.iter().map(|e| e.error_type).collect();
        assert_eq!(
            kinds,
            vec![
                ReferenceErrorKind::MissingUuid,
                ReferenceErrorKind::MissingUuid,
                ReferenceErrorKind::InvalidUuid,
                ReferenceErrorKind::InvalidUuid,
            ]
        );
        assert_eq!(errors[2].message, "Invalid UUID format: nope");
        assert_eq!(errors[3].value, "12");
    }

    #[test]
    fn test_content_refs() {
        let problems = vec![json!({
            "problem_id": "p",
            "content_refs": {
                "description_path": "r2://problems/leetcode/a/description.md",
                "examples_path": null,
                "constraints_path": "/tmp/constraints.json"
            }
        })];
        let errors = validate_content_refs(&problems);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "content_refs.constraints_path");
        assert_eq!(errors[0].record_id, "p");
    }

    #[test]
    fn test_source_urls_and_slugs() {
        let problems = vec![
            json!({"problem_id": "a", "slug": "ok-slug", "metadata": {"source_url": "https://x.com/p/"}}),
            json!({"problem_id": "b", "slug": "", "metadata": {"source_url": "not a url"}}),
            json!({"problem_id": "c", "slug": "Bad Slug", "metadata": {}}),
        ];
        let url_errors = validate_source_urls(&problems);
        assert_eq!(url_errors.len(), 1);
        assert_eq!(url_errors[0].record_id, "b");

        let slug_errors = validate_slugs(&problems);
        assert_eq!(slug_errors.len(), 2);
        assert_eq!(slug_errors[0].error_type, ReferenceErrorKind::MissingSlug);
        assert_eq!(slug_errors[1].error_type, ReferenceErrorKind::InvalidSlug);
        assert_eq!(slug_errors[1].value, "Bad Slug");
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_value(ReferenceErrorKind::InvalidR2Path).unwrap(),
            json!("invalid_r2_path")
        );
    }
}
