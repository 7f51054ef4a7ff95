//! Validation engine for canonical collections.
//!
//! Validation runs over collections as loaded from disk (`serde_json::Value`
//! records), so a writer/reader mismatch shows up as a finding rather than
//! being hidden by the typed models.
//!
//! # Findings
//!
//! | Category | Source |
//! |----------|--------|
//! | schema | [`schema::SchemaChecker`] per entity |
//! | duplicate | natural-key and primary-id grouping ([`duplicates`]) |
//! | orphan | topic, contest→problem and parent references ([`orphans`]) |
//! | reference | UUID, storage path, URL and slug formats ([`references`]) |
//! | warning | soft anomalies; never affect validity unless strict |
//!
//! Per-kind passes ([`Validator::validate_problems`] and friends) check one
//! collection. [`Validator::validate_all`] combines them and adds the
//! cross-collection orphan checks once.

pub mod duplicates;
pub mod orphans;
pub mod references;
pub mod schema;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub use duplicates::DuplicateError;
pub use orphans::{OrphanError, OrphanKind};
pub use references::{ReferenceError, ReferenceErrorKind};
pub use schema::{SchemaChecker, SchemaError, SchemaLoadError, SchemaSet, SchemaStore};

use crate::models::{EntityKind, KNOWN_CONTEST_TYPES};

/// Aggregated validation findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub total_errors: usize,
    pub schema_errors: Vec<SchemaError>,
    pub duplicate_errors: Vec<DuplicateError>,
    pub orphan_errors: Vec<OrphanError>,
    pub reference_errors: Vec<ReferenceError>,
    pub warnings: Vec<String>,
    pub stats: BTreeMap<String, usize>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.schema_errors.len()
            + self.duplicate_errors.len()
            + self.orphan_errors.len()
            + self.reference_errors.len()
    }

    fn absorb(&mut self, other: ValidationReport) {
        self.schema_errors.extend(other.schema_errors);
        self.duplicate_errors.extend(other.duplicate_errors);
        self.orphan_errors.extend(other.orphan_errors);
        self.reference_errors.extend(other.reference_errors);
        self.warnings.extend(other.warnings);
    }

    fn seal(mut self, strict: bool) -> Self {
        self.total_errors = self.error_count();
        self.is_valid = self.total_errors == 0 && (!strict || self.warnings.is_empty());
        self
    }
}

/// Runs every check with one [`SchemaChecker`].
#[derive(Debug, Clone)]
pub struct Validator {
    checker: SchemaChecker,
    schema_version: String,
    strict: bool,
}

impl Validator {
    pub fn new(checker: SchemaChecker, schema_version: impl Into<String>) -> Self {
        Self {
            checker,
            schema_version: schema_version.into(),
            strict: false,
        }
    }

    /// Select the checker for `schema_version` from `store`.
    pub fn for_version(store: &SchemaStore, schema_version: &str) -> Self {
        Self::new(SchemaChecker::select(store, schema_version), schema_version)
    }

    /// Treat warnings as errors when deciding validity.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn checker(&self) -> &SchemaChecker {
        &self.checker
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    fn schema_pass(&self, kind: EntityKind, records: &[Value]) -> Vec<SchemaError> {
        records
            .iter()
            .flat_map(|record| self.checker.check(kind, record))
            .collect()
    }

    fn duplicate_pass(&self, kind: EntityKind, records: &[Value]) -> Vec<DuplicateError> {
        duplicates::check_record_duplicates(records, kind)
    }

    pub fn validate_problems(&self, problems: &[Value]) -> ValidationReport {
        let mut report = ValidationReport {
            schema_errors: self.schema_pass(EntityKind::Problem, problems),
            duplicate_errors: self.duplicate_pass(EntityKind::Problem, problems),
            ..Default::default()
        };
        report
            .reference_errors
            .extend(references::validate_ids(problems, EntityKind::Problem.id_field()));
        report
            .reference_errors
            .extend(references::validate_content_refs(problems));
        report
            .reference_errors
            .extend(references::validate_source_urls(problems));
        report.reference_errors.extend(references::validate_slugs(problems));
        report.stats.insert("total_problems".into(), problems.len());
        report.seal(self.strict)
    }

    pub fn validate_contests(&self, contests: &[Value]) -> ValidationReport {
        let mut report = ValidationReport {
            schema_errors: self.schema_pass(EntityKind::Contest, contests),
            duplicate_errors: self.duplicate_pass(EntityKind::Contest, contests),
            reference_errors: references::validate_ids(contests, EntityKind::Contest.id_field()),
            ..Default::default()
        };
        for contest in contests {
            let Some(contest_type) = contest.get("type").and_then(Value::as_str) else {
                continue;
            };
            if !KNOWN_CONTEST_TYPES.contains(&contest_type) {
                let id = contest.get("external_id").and_then(Value::as_str).unwrap_or("unknown");
                report
                    .warnings
                    .push(format!("Unknown contest type '{}' for {}", contest_type, id));
            }
        }
        report.stats.insert("total_contests".into(), contests.len());
        report.seal(self.strict)
    }

    pub fn validate_topics(&self, topics: &[Value]) -> ValidationReport {
        let report = ValidationReport {
            schema_errors: self.schema_pass(EntityKind::Topic, topics),
            duplicate_errors: self.duplicate_pass(EntityKind::Topic, topics),
            orphan_errors: orphans::detect_orphan_parents(topics),
            reference_errors: references::validate_ids(topics, EntityKind::Topic.id_field()),
            stats: BTreeMap::from([("total_topics".to_string(), topics.len())]),
            ..Default::default()
        };
        report.seal(self.strict)
    }

    /// Validate all three collections, then run the cross-collection
    /// orphan checks.
    pub fn validate_all(&self, problems: &[Value], contests: &[Value], topics: &[Value]) -> ValidationReport {
        let mut report = ValidationReport::default();
        if !self.checker.is_structural() {
            report.warnings.push(format!(
                "Schema version {} not available; only required fields were checked",
                self.schema_version
            ));
        }

        report.absorb(self.validate_problems(problems));
        report.absorb(self.validate_contests(contests));
        report.absorb(self.validate_topics(topics));

        report
            .orphan_errors
            .extend(orphans::detect_orphan_topics(problems, topics));
        report
            .orphan_errors
            .extend(orphans::detect_orphan_problems(contests, problems));

        let counts = [
            ("total_problems", problems.len()),
            ("total_contests", contests.len()),
            ("total_topics", topics.len()),
            ("schema_errors", report.schema_errors.len()),
            ("duplicate_errors", report.duplicate_errors.len()),
            ("orphan_errors", report.orphan_errors.len()),
            ("reference_errors", report.reference_errors.len()),
        ];
        report.stats = counts.iter().map(|(k, v)| (k.to_string(), *v)).collect();

        let report = report.seal(self.strict);
        debug!(stats = ?report.stats, "validation stats");
        info!(
            schema_version = %self.schema_version,
            total_errors = report.total_errors,
            warnings = report.warnings.len(),
            valid = report.is_valid,
            "validation finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;
    use crate::topics::build_topic_document;
    use crate::transform::{CodeforcesTransformer, LeetCodeTransformer};
    use serde_json::json;

    fn validator() -> Validator {
        Validator::for_version(&SchemaStore::builtin().unwrap(), "v1.0.0")
    }

    fn to_values<T: Serialize>(items: &[T]) -> Vec<Value> {
        items.iter().map(|i| serde_json::to_value(i).unwrap()).collect()
    }

    fn leetcode_problem(external_id: &str, slug: &str) -> Value {
        let raw = json!({"questionId": external_id, "titleSlug": slug, "title": "T",
                         "difficulty": "Easy", "content": "<p>x</p>", "topicTags": [{"name": "Array"}]});
        serde_json::to_value(LeetCodeTransformer::default().transform_problem(&raw).data().unwrap()).unwrap()
    }

    #[test]
    fn test_codeforces_scenario_is_valid() {
        let doc = json!({
            "contest": {"id": 100, "name": "Test", "phase": "FINISHED", "type": "CF"},
            "problems": [{"contestId": 100, "index": "A", "name": "Sum", "rating": 800, "tags": ["math"]}]
        });
        let batch = CodeforcesTransformer::new().transform_all([("100.json", &doc)]);
        let report = validator().validate_all(
            &to_values(&batch.problems),
            &to_values(&batch.contests),
            &to_values(&batch.topics),
        );
        assert_eq!(report.total_errors, 0, "{:?}", report);
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
        assert_eq!(report.stats["total_problems"], 1);
    }

    #[test]
    fn test_orphan_topic_detected_once() {
        let mut problem = leetcode_problem("1", "two-sum");
        problem["topics"] = json!(["array", "quantum-sort"]);
        let problem_id = problem["problem_id"].as_str().unwrap().to_string();
        let topics = to_values(&[build_topic_document("array")]);

        let report = validator().validate_all(&[problem], &[], &topics);
        assert_eq!(report.orphan_errors.len(), 1);
        assert_eq!(report.orphan_errors[0].value, "quantum-sort");
        assert_eq!(report.orphan_errors[0].referenced_by, vec![problem_id]);
        assert!(!report.is_valid);
    }

    #[test]
    fn test_duplicate_external_id() {
        let a = leetcode_problem("1", "two-sum");
        let b = leetcode_problem("1", "two-sum-copy");
        assert_eq!(a["problem_id"], b["problem_id"]);
        let topics = to_values(&[build_topic_document("array")]);

        let report = validator().validate_all(&[a, b], &[], &topics);
        assert_eq!(report.duplicate_errors.len(), 1, "{:?}", report.duplicate_errors);
        assert_eq!(report.duplicate_errors[0].key, "leetcode:1");
        assert_eq!(report.duplicate_errors[0].occurrences.len(), 2);
        assert_eq!(report.total_errors, 1);
        assert!(!report.is_valid);
    }

    #[test]
    fn test_three_records_one_key_is_one_error() {
        let problems = vec![
            leetcode_problem("7", "reverse-integer"),
            leetcode_problem("7", "reverse-integer-ii"),
            leetcode_problem("7", "reverse-integer-iii"),
        ];
        let topics = to_values(&[build_topic_document("array")]);

        let report = validator().validate_all(&problems, &[], &topics);
        assert_eq!(report.duplicate_errors.len(), 1, "{:?}", report.duplicate_errors);
        assert_eq!(report.duplicate_errors[0].entity_type, "problem");
        assert_eq!(report.duplicate_errors[0].occurrences.len(), 3);
        assert_eq!(report.total_errors, 1);
    }

    #[test]
    fn test_fallback_checker_warns_but_stays_valid() {
        let v = Validator::for_version(&SchemaStore::builtin().unwrap(), "v0.0.1");
        let report = v.validate_all(&[leetcode_problem("1", "two-sum")], &[], &to_values(&[build_topic_document("array")]));
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("v0.0.1"));

        let strict = v.strict(true).validate_all(&[], &[], &[]);
        assert!(!strict.is_valid);
        assert_eq!(strict.total_errors, 0);
    }

    #[test]
    fn test_unknown_contest_type_is_warning() {
        let contest = json!({
            "contest_id": crate::identity::contest_id(Source::Codeforces, "5").to_string(),
            "source": "codeforces", "external_id": "5", "name": "Gym round", "type": "GYM",
            "duration_seconds": 0, "start_time": null, "phase": "FINISHED", "problems": []
        });
        let report = validator().validate_contests(&[contest]);
        assert!(report.is_valid);
        assert_eq!(report.warnings, vec!["Unknown contest type 'GYM' for 5".to_string()]);
    }

    #[test]
    fn test_orphan_parent_reported_by_topic_pass() {
        let topics = to_values(&[build_topic_document("segment-tree")]);
        let report = validator().validate_topics(&topics);
        assert_eq!(report.orphan_errors.len(), 1);
        assert_eq!(report.orphan_errors[0].orphan_type, OrphanKind::ParentTopic);
    }

    #[test]
    fn test_report_serializes_categories() {
        let report = validator().validate_all(&[], &[], &[]);
        let value = serde_json::to_value(&report).unwrap();
        for key in ["is_valid", "total_errors", "schema_errors", "duplicate_errors", "orphan_errors", "reference_errors", "warnings", "stats"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }
}
