//! Codeforces contest documents → canonical [`Problem`]s and [`Contest`]s.
//!
//! Input is one document per contest, `{"contest": {...}, "problems": [...]}`.
//! Each document transforms into its own [`CodeforcesBatch`]; batches merge
//! and [`CodeforcesBatch::finish`] derives the topic list at the end.

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use super::fields::{self, Field};
use super::{Outcome, TransformStats};
use crate::identity;
use crate::models::{
    Contest, ContestProblemRef, ContentRefs, Difficulty, Problem, ProblemMetadata, Source, Topic,
    KNOWN_CONTEST_TYPES,
};
use crate::topics;

const CONTEST_ID: Field = Field::new("contest_id", &["contestId"]);
const INDEX: Field = Field::new("index", &["index"]);
const NAME: Field = Field::new("name", &["name"]);
const TAGS: Field = Field::new("tags", &["tags"]);

/// Upper bounds (exclusive) of the easy and medium rating bands.
pub const EASY_BELOW: i64 = 1200;
pub const MEDIUM_BELOW: i64 = 1800;

const SLUG_TITLE_MAX: usize = 30;

/// Map a Codeforces rating to a difficulty bucket. Unrated is medium.
pub fn rating_to_difficulty(rating: Option<i64>) -> Difficulty {
    match rating {
        None => Difficulty::Medium,
        Some(r) if r < EASY_BELOW => Difficulty::Easy,
        Some(r) if r < MEDIUM_BELOW => Difficulty::Medium,
        Some(_) => Difficulty::Hard,
    }
}

/// Accumulated output of one or more contest documents.
#[derive(Debug, Clone, Default)]
pub struct CodeforcesBatch {
    pub problems: Vec<Problem>,
    pub contests: Vec<Contest>,
    pub topics: Vec<Topic>,
    pub problem_stats: TransformStats,
    pub contest_stats: TransformStats,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CodeforcesBatch {
    /// A document that could not be read or parsed counts as one failed
    /// contest.
    pub fn unreadable(tag: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            contest_stats: TransformStats {
                total: 1,
                failed: 1,
                ..Default::default()
            },
            errors: vec![format!("[{}] Failed to process: {}", tag, reason)],
            ..Default::default()
        }
    }

    pub fn merge(mut self, other: CodeforcesBatch) -> Self {
        self.problems.extend(other.problems);
        self.contests.extend(other.contests);
        self.problem_stats.merge(&other.problem_stats);
        self.contest_stats.merge(&other.contest_stats);
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }

    /// Derive the sorted topic documents from every merged problem.
    pub fn finish(mut self) -> Self {
        let names: BTreeSet<&String> = self.problems.iter().flat_map(|p| &p.topics).collect();
        self.topics = topics::build_topic_documents(names);
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeforcesTransformer;

impl CodeforcesTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Transform one problem. `contest_id` is used when the record does
    /// not carry its own `contestId`.
    pub fn transform_problem(&self, raw: &Value, contest_id: &str) -> Outcome<Problem> {
        let mut warnings = Vec::new();

        let problem_contest_id = CONTEST_ID
            .identity(raw)
            .unwrap_or_else(|| contest_id.to_string());

        let Some(index) = INDEX.text(raw) else {
            return Outcome::failed(format!(
                "Missing index for problem in contest {}",
                problem_contest_id
            ));
        };
        if problem_contest_id.is_empty() {
            return Outcome::failed(format!("Missing contest id for problem {}", index));
        }

        let external_id = format!("{}-{}", problem_contest_id, index);

        let title = match NAME.text(raw) {
            Some(name) => name,
            None => {
                warnings.push(format!("Missing name for problem {}", external_id));
                format!("Problem {}", index)
            }
        };

        let slug = format!(
            "{}-{}-{}",
            problem_contest_id.to_lowercase(),
            index.to_lowercase(),
            slug_fragment(&title)
        );

        let rating = match raw.get("rating") {
            None | Some(Value::Null) => None,
            Some(value) => match parse_rating(value) {
                Some(r) => Some(r),
                None => {
                    let shown = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    warnings.push(format!("Invalid rating '{}' for {}", shown, external_id));
                    None
                }
            },
        };

        let tag_names: Vec<String> = TAGS
            .resolve(raw)
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(fields::as_text).collect())
            .unwrap_or_default();

        let metadata = ProblemMetadata {
            frontend_id: None,
            contest_index: Some(index.clone()),
            source_url: format!(
                "https://codeforces.com/problemset/problem/{}/{}",
                problem_contest_id, index
            ),
            points: raw.get("points").filter(|v| fields::is_present(v)).cloned(),
            is_premium: None,
            accept_rate: None,
            likes: None,
            dislikes: None,
        };

        let problem = Problem {
            problem_id: identity::problem_id(Source::Codeforces, &external_id).to_string(),
            source: Source::Codeforces,
            external_id,
            slug,
            title,
            difficulty: rating_to_difficulty(rating),
            rating,
            metadata,
            topics: topics::normalize_topics(&tag_names),
            content_refs: ContentRefs::unavailable(),
        };
        debug!(external_id = %problem.external_id, "transformed codeforces problem");
        Outcome::transformed(problem, warnings)
    }

    /// Transform the contest record, referencing its already-transformed
    /// problems in order.
    pub fn transform_contest(&self, raw: &Value, problems: &[Problem]) -> Outcome<Contest> {
        let mut warnings = Vec::new();

        let Some(external_id) = fields::identity_of(raw, "id") else {
            return Outcome::failed("Missing contest id");
        };

        let name = match NAME.text(raw) {
            Some(name) => name,
            None => {
                warnings.push(format!("Missing name for contest {}", external_id));
                format!("Contest {}", external_id)
            }
        };

        let contest_type = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("CF")
            .to_string();
        if !KNOWN_CONTEST_TYPES.contains(&contest_type.as_str()) {
            warnings.push(format!(
                "Unknown contest type '{}' for {}",
                contest_type, external_id
            ));
        }

        let phase = raw
            .get("phase")
            .and_then(Value::as_str)
            .unwrap_or("FINISHED")
            .to_string();
        if phase != "FINISHED" {
            warnings.push(format!(
                "Contest {} has phase '{}', expected FINISHED",
                external_id, phase
            ));
        }

        let problem_refs = problems
            .iter()
            .map(|p| ContestProblemRef {
                problem_external_id: p.external_id.clone(),
                index: p.metadata.contest_index.clone().unwrap_or_default(),
            })
            .collect();

        Outcome::transformed(
            Contest {
                contest_id: identity::contest_id(Source::Codeforces, &external_id).to_string(),
                source: Source::Codeforces,
                external_id,
                name,
                contest_type,
                duration_seconds: raw
                    .get("durationSeconds")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
                start_time: raw.get("startTimeSeconds").and_then(Value::as_i64),
                phase,
                problems: problem_refs,
            },
            warnings,
        )
    }

    /// Transform one contest document. `tag` names the document (its file
    /// name) in contest-level errors.
    pub fn transform_document(&self, tag: &str, document: &Value) -> CodeforcesBatch {
        if !document.is_object() {
            return CodeforcesBatch::unreadable(tag, "expected an object with contest and problems");
        }

        let empty = Value::Object(Default::default());
        let raw_contest = document.get("contest").unwrap_or(&empty);
        let raw_problems = fields::array_of(document, "problems");
        let contest_id = fields::identity_of(raw_contest, "id").unwrap_or_default();

        let mut batch = CodeforcesBatch::default();
        batch.problem_stats.total = raw_problems.len();

        for raw in raw_problems {
            let outcome = self.transform_problem(raw, &contest_id);
            batch.problem_stats.record(&outcome);
            match outcome {
                Outcome::Transformed { data, warnings } => {
                    batch.warnings.extend(warnings);
                    batch.problems.push(data);
                }
                Outcome::Failed { errors } => batch.errors.extend(
                    errors
                        .into_iter()
                        .map(|e| format!("[contest:{}] {}", contest_id, e)),
                ),
            }
        }

        let outcome = self.transform_contest(raw_contest, &batch.problems);
        batch.contest_stats.total = 1;
        batch.contest_stats.record(&outcome);
        match outcome {
            Outcome::Transformed { data, warnings } => {
                batch.warnings.extend(warnings);
                batch.contests.push(data);
            }
            Outcome::Failed { errors } => batch
                .errors
                .extend(errors.into_iter().map(|e| format!("[{}] {}", tag, e))),
        }

        batch
    }

    /// Transform `(tag, document)` pairs in order and finish the batch.
    pub fn transform_all<'a, I>(&self, documents: I) -> CodeforcesBatch
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        documents
            .into_iter()
            .map(|(tag, document)| self.transform_document(tag, document))
            .fold(CodeforcesBatch::default(), CodeforcesBatch::merge)
            .finish()
    }
}

/// Integer ratings pass through, floats truncate, numeric strings parse.
fn parse_rating(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// ASCII-only, lowercase, alphanumerics joined by single hyphens, at most
/// 30 characters. Titles with nothing usable become `problem`.
fn slug_fragment(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let joined = kept.split_whitespace().collect::<Vec<_>>().join("-");
    let fragment: String = joined.chars().take(SLUG_TITLE_MAX).collect();
    if fragment.is_empty() {
        "problem".to_string()
    } else {
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contest_doc() -> Value {
        json!({
            "contest": {"id": 100, "name": "Test", "phase": "FINISHED", "type": "CF"},
            "problems": [{"contestId": 100, "index": "A", "name": "Sum", "rating": 800, "tags": ["math"]}]
        })
    }

    #[test]
    fn test_difficulty_thresholds() {
        assert_eq!(rating_to_difficulty(Some(800)), Difficulty::Easy);
        assert_eq!(rating_to_difficulty(Some(1199)), Difficulty::Easy);
        assert_eq!(rating_to_difficulty(Some(1200)), Difficulty::Medium);
        assert_eq!(rating_to_difficulty(Some(1799)), Difficulty::Medium);
        assert_eq!(rating_to_difficulty(Some(1800)), Difficulty::Hard);
        assert_eq!(rating_to_difficulty(None), Difficulty::Medium);
    }

    #[test]
    fn test_single_contest_document() {
        let batch = CodeforcesTransformer::new().transform_all([("100.json", &contest_doc())]);
        assert!(batch.errors.is_empty());
        assert_eq!(batch.problems.len(), 1);
        let problem = &batch.problems[0];
        assert!(problem.slug.starts_with("100-a-"));
        assert_eq!(problem.slug, "100-a-sum");
        assert_eq!(problem.external_id, "100-A");
        assert_eq!(problem.difficulty, Difficulty::Easy);
        assert_eq!(problem.rating, Some(800));
        assert_eq!(problem.topics, vec!["math"]);
        assert_eq!(problem.content_refs, ContentRefs::unavailable());
        assert_eq!(
            problem.metadata.source_url,
            "https://codeforces.com/problemset/problem/100/A"
        );

        assert_eq!(batch.contests.len(), 1);
        let contest = &batch.contests[0];
        assert_eq!(
            contest.problems,
            vec![ContestProblemRef {
                problem_external_id: "100-A".into(),
                index: "A".into()
            }]
        );
        assert_eq!(contest.contest_id, identity::contest_id(Source::Codeforces, "100").to_string());

        let names: Vec<&str> = batch.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["math"]);
        assert_eq!(batch.problem_stats.success, 1);
        assert_eq!(batch.contest_stats.success, 1);
    }

    #[test]
    fn test_slug_fragment() {
        assert_eq!(slug_fragment("Hello,  World!"), "hello-world");
        assert_eq!(slug_fragment("Ñandú"), "and");
        assert_eq!(slug_fragment("Задача"), "problem");
        assert_eq!(
            slug_fragment("A very long problem title that keeps on going"),
            "a-very-long-problem-title-that"
        );
    }

    #[test]
    fn test_problem_falls_back_to_contest_id_and_warns() {
        let raw = json!({"index": "B", "rating": "hard-ish", "points": 1000.0});
        let Outcome::Transformed { data, warnings } = CodeforcesTransformer::new().transform_problem(&raw, "55") else {
            panic!("expected success");
        };
        assert_eq!(data.external_id, "55-B");
        assert_eq!(data.title, "Problem B");
        assert_eq!(data.slug, "55-b-problem-b");
        assert_eq!(data.rating, None);
        assert_eq!(data.difficulty, Difficulty::Medium);
        assert_eq!(data.metadata.points, Some(json!(1000.0)));
        assert_eq!(
            warnings,
            vec![
                "Missing name for problem 55-B".to_string(),
                "Invalid rating 'hard-ish' for 55-B".to_string(),
            ]
        );
    }

    #[test]
    fn test_rating_parsing() {
        let t = CodeforcesTransformer::new();
        let float = t.transform_problem(&json!({"index": "A", "name": "x", "rating": 1500.7}), "1");
        assert_eq!(float.data().and_then(|p| p.rating), Some(1500));
        let text = t.transform_problem(&json!({"index": "A", "name": "x", "rating": "2100"}), "1");
        assert_eq!(text.data().map(|p| p.difficulty), Some(Difficulty::Hard));
    }

    #[test]
    fn test_missing_index_or_contest_is_fatal() {
        let t = CodeforcesTransformer::new();
        assert_eq!(
            t.transform_problem(&json!({"name": "x"}), "7").errors(),
            ["Missing index for problem in contest 7".to_string()]
        );
        assert_eq!(
            t.transform_problem(&json!({"index": "C"}), "").errors(),
            ["Missing contest id for problem C".to_string()]
        );
    }

    #[test]
    fn test_contest_warnings_and_defaults() {
        let raw = json!({"id": "9", "type": "Gym", "phase": "BEFORE", "startTimeSeconds": 1700000000});
        let Outcome::Transformed { data, warnings } = CodeforcesTransformer::new().transform_contest(&raw, &[]) else {
            panic!("expected success");
        };
        assert_eq!(data.name, "Contest 9");
        assert_eq!(data.contest_type, "Gym");
        assert_eq!(data.duration_seconds, 0);
        assert_eq!(data.start_time, Some(1_700_000_000));
        assert_eq!(warnings.len(), 3);
        assert!(warnings[1].contains("Unknown contest type 'Gym'"));
        assert!(warnings[2].contains("has phase 'BEFORE'"));
    }

    #[test]
    fn test_contest_zero_is_a_real_id() {
        let doc = json!({
            "contest": {"id": 0, "name": "Round Zero", "type": "CF"},
            "problems": [{"contestId": 0, "index": "A", "name": "Start", "rating": 800}]
        });
        let batch = CodeforcesTransformer::new().transform_all([("0.json", &doc)]);
        assert!(batch.errors.is_empty(), "{:?}", batch.errors);
        assert_eq!(batch.contests.len(), 1);
        assert_eq!(batch.contests[0].external_id, "0");
        assert_eq!(batch.problems.len(), 1);
        assert_eq!(batch.problems[0].external_id, "0-A");
    }

    #[test]
    fn test_document_errors_are_tagged() {
        let doc = json!({
            "contest": {"name": "No id"},
            "problems": [{"index": "A", "name": "x"}]
        });
        let batch = CodeforcesTransformer::new().transform_all([("12.json", &doc)]);
        assert_eq!(
            batch.errors,
            vec![
                "[contest:] Missing contest id for problem A".to_string(),
                "[12.json] Missing contest id".to_string(),
            ]
        );
        assert_eq!(batch.problem_stats.failed, 1);
        assert_eq!(batch.contest_stats.failed, 1);
        assert!(batch.contests.is_empty());
    }

    #[test]
    fn test_merge_unreadable_and_topics() {
        let t = CodeforcesTransformer::new();
        let other = json!({
            "contest": {"id": 200, "name": "Two"},
            "problems": [
                {"contestId": 200, "index": "A", "name": "Paths", "tags": ["graphs", "dfs and similar"]},
                {"contestId": 200, "index": "B", "name": "More", "tags": ["math", "dp"]}
            ]
        });
        let batch = t
            .transform_document("100.json", &contest_doc())
            .merge(CodeforcesBatch::unreadable("bad.json", "expected value at line 1"))
            .merge(t.transform_document("200.json", &other))
            .finish();

        assert_eq!(batch.contest_stats.total, 3);
        assert_eq!(batch.contest_stats.failed, 1);
        assert_eq!(batch.problem_stats.total, 3);
        assert!(batch
            .errors
            .contains(&"[bad.json] Failed to process: expected value at line 1".to_string()));
        let names: Vec<&str> = batch.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["dfs-and-similar", "dynamic-programming", "graph", "math"]);
    }

    #[test]
    fn test_non_object_document_is_unreadable() {
        let batch = CodeforcesTransformer::new().transform_document("3.json", &json!([1, 2]));
        assert_eq!(batch.contest_stats.failed, 1);
        assert!(batch.errors[0].starts_with("[3.json] Failed to process:"));
    }
}
