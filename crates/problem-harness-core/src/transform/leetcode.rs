//! LeetCode records → canonical [`Problem`]s.

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use super::fields::{self, Field};
use super::{Outcome, TransformStats};
use crate::content::{self, ProblemContent};
use crate::identity;
use crate::models::{ContentRefs, Difficulty, Problem, ProblemMetadata, Source, Topic};
use crate::topics;

const EXTERNAL_ID: Field = Field::new("external_id", &["problem_id", "questionId"]);
const FRONTEND_ID: Field = Field::new("frontend_id", &["frontend_id", "questionFrontendId"]);
const SLUG: Field = Field::new("slug", &["problem_slug", "titleSlug"]);
const ERROR_SLUG: Field = Field::new("slug", &["titleSlug", "problem_slug"]);
const TITLE: Field = Field::new("title", &["title", "questionTitle"]);
const TOPICS: Field = Field::new("topics", &["topicTags", "topics"]);
const DESCRIPTION: Field = Field::new("description", &["description", "question", "content"]);
const PREMIUM: Field = Field::new("is_premium", &["isPaidOnly", "paidOnly"]);
const CODE_SNIPPETS: Field = Field::new("code_snippets", &["code_snippets", "codeSnippets"]);

pub const DEFAULT_CONTENT_BASE: &str = "r2://problems/leetcode";

/// Raw problem records inside a LeetCode document: a bare array, or an
/// object wrapping one under `questions` or `problems`. `None` for any
/// other shape.
pub fn leetcode_records(document: &Value) -> Option<&[Value]> {
    match document {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(_) => Some(
            ["questions", "problems"]
                .iter()
                .filter_map(|key| document.get(key))
                .find(|v| fields::is_present(v))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        ),
        _ => None,
    }
}

/// Output of one LeetCode batch.
#[derive(Debug, Clone, Default)]
pub struct LeetCodeBatch {
    pub problems: Vec<Problem>,
    pub topics: Vec<Topic>,
    pub stats: TransformStats,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LeetCodeTransformer {
    content_base: String,
}

impl Default for LeetCodeTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_CONTENT_BASE)
    }
}

impl LeetCodeTransformer {
    pub fn new(content_base: impl Into<String>) -> Self {
        let content_base: String = content_base.into();
        Self {
            content_base: content_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn content_base(&self) -> &str {
        &self.content_base
    }

    pub fn transform_problem(&self, raw: &Value) -> Outcome<Problem> {
        let mut warnings = Vec::new();

        let Some(external_id) = EXTERNAL_ID.text(raw).or_else(|| FRONTEND_ID.text(raw)) else {
            return Outcome::failed("Missing external_id (problem_id, questionId, or frontend_id)");
        };

        let Some(slug) = SLUG.text(raw) else {
            return Outcome::failed(format!("Missing slug for problem {}", external_id));
        };

        let title = match TITLE.text(raw) {
            Some(title) => title,
            None => {
                warnings.push(format!("Missing title for {}, using slug as title", slug));
                humanize_slug(&slug)
            }
        };

        let raw_difficulty = raw
            .get("difficulty")
            .and_then(fields::as_text)
            .map(|d| d.to_lowercase())
            .unwrap_or_default();
        let difficulty = match parse_difficulty(&raw_difficulty) {
            Some(d) => d,
            None => {
                if !raw_difficulty.is_empty() {
                    warnings.push(format!(
                        "Unknown difficulty '{}', defaulting to 'medium'",
                        raw_difficulty
                    ));
                }
                Difficulty::Medium
            }
        };

        let topic_names = raw_topic_names(TOPICS.resolve(raw));
        let topics = topics::normalize_topics(&topic_names);

        let mut content_refs = ContentRefs {
            description_path: Some(format!("{}/{}/description.md", self.content_base, slug)),
            examples_path: Some(format!("{}/{}/examples.json", self.content_base, slug)),
            constraints_path: Some(format!("{}/{}/constraints.json", self.content_base, slug)),
        };
        if DESCRIPTION.text(raw).is_none() {
            content_refs.description_path = None;
            warnings.push(format!("No description content for {}", slug));
        }

        let metadata = ProblemMetadata {
            frontend_id: Some(FRONTEND_ID.text(raw).unwrap_or_else(|| external_id.clone())),
            contest_index: None,
            source_url: format!("https://leetcode.com/problems/{}/", slug),
            points: None,
            is_premium: PREMIUM.resolve(raw).map(|_| true),
            accept_rate: present(raw, "acRate"),
            likes: present(raw, "likes"),
            dislikes: present(raw, "dislikes"),
        };

        let problem = Problem {
            problem_id: identity::problem_id(Source::Leetcode, &external_id).to_string(),
            source: Source::Leetcode,
            external_id,
            slug,
            title,
            difficulty,
            rating: None,
            metadata,
            topics,
            content_refs,
        };
        debug!(slug = %problem.slug, warnings = warnings.len(), "transformed leetcode problem");
        Outcome::transformed(problem, warnings)
    }

    /// Transform every record. Errors are tagged with the record's slug.
    pub fn transform_all(&self, records: &[Value]) -> LeetCodeBatch {
        let mut batch = LeetCodeBatch {
            stats: TransformStats {
                total: records.len(),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut topic_names = BTreeSet::new();

        for raw in records {
            let outcome = self.transform_problem(raw);
            batch.stats.record(&outcome);
            match outcome {
                Outcome::Transformed { data, warnings } => {
                    topic_names.extend(data.topics.iter().cloned());
                    batch.warnings.extend(warnings);
                    batch.problems.push(data);
                }
                Outcome::Failed { errors } => {
                    let tag = ERROR_SLUG.text(raw).unwrap_or_else(|| "unknown".to_string());
                    batch
                        .errors
                        .extend(errors.into_iter().map(|e| format!("[{}] {}", tag, e)));
                }
            }
        }

        batch.topics = topics::build_topic_documents(&topic_names);
        batch
    }

    /// Transform a whole LeetCode document (see [`leetcode_records`]).
    pub fn transform_document(&self, document: &Value) -> LeetCodeBatch {
        match leetcode_records(document) {
            Some(records) => self.transform_all(records),
            None => LeetCodeBatch {
                stats: TransformStats {
                    failed: 1,
                    ..Default::default()
                },
                errors: vec!["Invalid JSON format - expected list or object".to_string()],
                ..Default::default()
            },
        }
    }
}

/// The slug a raw record will be published under, if it has one.
pub fn record_slug(raw: &Value) -> Option<String> {
    SLUG.text(raw)
}

/// Structured content of a raw record, for external storage.
///
/// Examples and constraints parsed from the description take precedence;
/// the raw record's own `examples` / `constraints` arrays are the fallback.
pub fn extract_content(raw: &Value) -> ProblemContent {
    let html = DESCRIPTION.text(raw).unwrap_or_default();

    let mut examples: Vec<Value> = content::extract_examples(&html)
        .into_iter()
        .filter_map(|e| serde_json::to_value(e).ok())
        .collect();
    if examples.is_empty() {
        examples = fields::array_of(raw, "examples").to_vec();
    }

    let mut constraints = content::extract_constraints(&html);
    if constraints.is_empty() {
        constraints = fields::array_of(raw, "constraints")
            .iter()
            .filter_map(fields::as_text)
            .collect();
    }

    ProblemContent {
        description: content::to_markdown(&html),
        examples,
        constraints,
        hints: fields::array_of(raw, "hints").to_vec(),
        code_snippets: CODE_SNIPPETS
            .resolve(raw)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

fn parse_difficulty(raw: &str) -> Option<Difficulty> {
    match raw {
        "easy" | "1" => Some(Difficulty::Easy),
        "medium" | "2" => Some(Difficulty::Medium),
        "hard" | "3" => Some(Difficulty::Hard),
        _ => None,
    }
}

/// Topic tags arrive either as `{name, slug}` objects or as bare strings.
fn raw_topic_names(value: Option<&Value>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => fields::text_of(item, "name").or_else(|| fields::text_of(item, "slug")),
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

fn present(raw: &Value, key: &str) -> Option<Value> {
    raw.get(key).filter(|v| fields::is_present(v)).cloned()
}

/// `two-sum-ii` → `Two Sum Ii`: hyphens to spaces, each alphabetic run
/// capitalized.
fn humanize_slug(slug: &str) -> String {
    let mut out = String::with_capacity(slug.len());
    let mut in_word = false;
    for c in slug.chars() {
        let c = if c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use serde_json::json;

    fn two_sum() -> Value {
        json!({
            "questionId": "1",
            "questionFrontendId": "1",
            "title": "Two Sum",
            "titleSlug": "two-sum",
            "difficulty": "Easy",
            "isPaidOnly": false,
            "acRate": 52.3,
            "likes": 1000,
            "topicTags": [{"name": "Array", "slug": "array"}, {"name": "Hash Table", "slug": "hash-table"}],
            "content": "<p>Given an array...</p>"
        })
    }

    #[test]
    fn test_transform_full_record() {
        let outcome = LeetCodeTransformer::default().transform_problem(&two_sum());
        let Outcome::Transformed { data, warnings } = outcome else {
            panic!("expected success");
        };
        assert!(warnings.is_empty());
        assert_eq!(data.external_id, "1");
        assert_eq!(data.slug, "two-sum");
        assert_eq!(data.difficulty, Difficulty::Easy);
        assert_eq!(data.topics, vec!["array", "hash-table"]);
        assert_eq!(data.rating, None);
        assert_eq!(data.problem_id, identity::problem_id(Source::Leetcode, "1").to_string());
        assert_eq!(data.metadata.frontend_id.as_deref(), Some("1"));
        assert_eq!(data.metadata.source_url, "https://leetcode.com/problems/two-sum/");
        assert_eq!(data.metadata.is_premium, None);
        assert_eq!(data.metadata.accept_rate, Some(json!(52.3)));
        assert_eq!(data.metadata.dislikes, None);
        assert_eq!(
            data.content_refs.description_path.as_deref(),
            Some("r2://problems/leetcode/two-sum/description.md")
        );
    }

    #[test]
    fn test_external_id_falls_back_to_frontend_id() {
        let raw = json!({"frontend_id": 15, "problem_slug": "3sum", "title": "3Sum", "description": "x"});
        let outcome = LeetCodeTransformer::default().transform_problem(&raw);
        assert_eq!(outcome.data().map(|p| p.external_id.as_str()), Some("15"));
    }

    #[test]
    fn test_missing_identity_and_slug_are_fatal() {
        let t = LeetCodeTransformer::default();
        let no_id = t.transform_problem(&json!({"titleSlug": "x"}));
        assert_eq!(
            no_id.errors(),
            ["Missing external_id (problem_id, questionId, or frontend_id)".to_string()]
        );
        let no_slug = t.transform_problem(&json!({"questionId": "9"}));
        assert_eq!(no_slug.errors(), ["Missing slug for problem 9".to_string()]);
    }

    #[test]
    fn test_warnings_for_defaults() {
        let raw = json!({"questionId": "2", "titleSlug": "add-two-numbers", "difficulty": "Brutal", "isPaidOnly": true});
        let Outcome::Transformed { data, warnings } = LeetCodeTransformer::default().transform_problem(&raw) else {
            panic!("expected success");
        };
        assert_eq!(data.title, "Add Two Numbers");
        assert_eq!(data.difficulty, Difficulty::Medium);
        assert_eq!(data.content_refs.description_path, None);
        assert!(data.content_refs.examples_path.is_some());
        assert_eq!(data.metadata.is_premium, Some(true));
        assert_eq!(
            warnings,
            vec![
                "Missing title for add-two-numbers, using slug as title".to_string(),
                "Unknown difficulty 'brutal', defaulting to 'medium'".to_string(),
                "No description content for add-two-numbers".to_string(),
            ]
        );
    }

    #[test]
    fn test_numeric_difficulty_and_string_topics() {
        let raw = json!({"questionId": "3", "titleSlug": "s", "title": "S", "difficulty": 3,
                         "topics": ["Dynamic Programming", "dp"], "content": "c"});
        let problem = LeetCodeTransformer::default().transform_problem(&raw);
        let problem = problem.data().unwrap();
        assert_eq!(problem.difficulty, Difficulty::Hard);
        assert_eq!(problem.topics, vec!["dynamic-programming"]);
    }

    #[test]
    fn test_batch_collects_errors_and_topics() {
        let records = vec![
            two_sum(),
            json!({"titleSlug": "broken"}),
            json!({"questionId": "5", "titleSlug": "longest", "title": "L", "content": "c",
                   "topicTags": [{"name": "String"}, {"name": "Array"}]}),
        ];
        let batch = LeetCodeTransformer::default().transform_all(&records);
        assert_eq!(batch.stats.total, 3);
        assert_eq!(batch.stats.success, 2);
        assert_eq!(batch.stats.failed, 1);
        assert_eq!(batch.problems.len(), 2);
        assert_eq!(batch.errors.len(), 1);
        assert!(batch.errors[0].starts_with("[broken] Missing external_id"));
        let names: Vec<&str> = batch.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["array", "hash-table", "string"]);
        assert_eq!(batch.topics[0].category, Category::Dsa);
        assert_eq!(batch.topics[2].category, Category::Other);
    }

    #[test]
    fn test_transformer_is_reusable_across_batches() {
        let t = LeetCodeTransformer::default();
        let first = t.transform_all(&[two_sum()]);
        let second = t.transform_all(&[json!({"questionId": "7", "titleSlug": "x", "content": "c"})]);
        assert_eq!(first.topics.len(), 2);
        assert!(second.topics.is_empty());
    }

    #[test]
    fn test_document_shapes() {
        assert_eq!(leetcode_records(&json!([two_sum()])).map(<[Value]>::len), Some(1));
        assert_eq!(leetcode_records(&json!({"questions": [two_sum()]})).map(<[Value]>::len), Some(1));
        assert_eq!(leetcode_records(&json!({"problems": [two_sum(), two_sum()]})).map(<[Value]>::len), Some(2));
        assert_eq!(leetcode_records(&json!({"other": 1})).map(<[Value]>::len), Some(0));
        assert!(leetcode_records(&json!("nope")).is_none());

        let batch = LeetCodeTransformer::default().transform_document(&json!(42));
        assert_eq!(batch.stats.failed, 1);
        assert_eq!(batch.errors, vec!["Invalid JSON format - expected list or object".to_string()]);
    }

    #[test]
    fn test_custom_content_base() {
        let t = LeetCodeTransformer::new("r2://bucket/lc/");
        let problem = t.transform_problem(&two_sum());
        assert_eq!(
            problem.data().and_then(|p| p.content_refs.constraints_path.clone()).as_deref(),
            Some("r2://bucket/lc/two-sum/constraints.json")
        );
    }

    #[test]
    fn test_extract_content_falls_back_to_raw_arrays() {
        let raw = json!({
            "content": "<p>Plain <em>statement</em></p>",
            "examples": ["1 2 -> 3"],
            "constraints": ["n >= 1"],
            "hints": ["think"],
            "codeSnippets": [{"lang": "Rust", "code": "fn main() {}"}]
        });
        let content = extract_content(&raw);
        assert_eq!(content.description, "Plain *statement*");
        assert_eq!(content.examples, vec![json!("1 2 -> 3")]);
        assert_eq!(content.constraints, vec!["n >= 1"]);
        assert_eq!(content.hints, vec![json!("think")]);
        assert_eq!(content.code_snippets.len(), 1);
    }

    #[test]
    fn test_humanize_slug() {
        assert_eq!(humanize_slug("two-sum-ii"), "Two Sum Ii");
        assert_eq!(humanize_slug("3sum"), "3Sum");
    }
}
