//! Cross-collection orphan reference detection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanKind {
    /// Topic used by a problem but missing from the topic collection.
    Topic,
    /// `source:external_id` referenced by a contest but missing from the
    /// problem collection.
    Problem,
    /// Topic parent that is not itself a defined topic.
    ParentTopic,
}

impl fmt::Display for OrphanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrphanKind::Topic => "topic",
            OrphanKind::Problem => "problem",
            OrphanKind::ParentTopic => "parent_topic",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanError {
    #[serde(rename = "type")]
    pub orphan_type: OrphanKind,
    pub value: String,
    pub referenced_by: Vec<String>,
    pub message: String,
}

fn str_field<'a>(record: &'a Value, field: &str) -> &'a str {
    record.get(field).and_then(Value::as_str).unwrap_or("")
}

fn str_field_or_unknown(record: &Value, field: &str) -> String {
    match str_field(record, field) {
        "" => "unknown".to_string(),
        s => s.to_string(),
    }
}

/// Collects `value → referrers` in first-seen order.
#[derive(Default)]
struct Usage {
    index: HashMap<String, usize>,
    entries: Vec<(String, Vec<String>)>,
}

impl Usage {
    fn add(&mut self, value: &str, referrer: String) {
        match self.index.get(value) {
            Some(&i) => self.entries[i].1.push(referrer),
            None => {
                self.index.insert(value.to_string(), self.entries.len());
                self.entries.push((value.to_string(), vec![referrer]));
            }
        }
    }

    fn into_errors(self, kind: OrphanKind, describe: impl Fn(&str, usize) -> String) -> Vec<OrphanError> {
        self.entries
            .into_iter()
            .map(|(value, referenced_by)| OrphanError {
                orphan_type: kind,
                message: describe(&value, referenced_by.len()),
                value,
                referenced_by,
            })
            .collect()
    }
}

fn topic_names(topics: &[Value]) -> HashSet<&str> {
    topics.iter().map(|t| str_field(t, "name")).collect()
}

/// Topics used by problems that the topic collection does not define.
pub fn detect_orphan_topics(problems: &[Value], topics: &[Value]) -> Vec<OrphanError> {
    let defined = topic_names(topics);
    let mut usage = Usage::default();
    for problem in problems {
        let used = problem.get("topics").and_then(Value::as_array);
        for topic in used.into_iter().flatten().filter_map(Value::as_str) {
            if !defined.contains(topic) {
                usage.add(topic, str_field_or_unknown(problem, "problem_id"));
            }
        }
    }
    usage.into_errors(OrphanKind::Topic, |topic, n| {
        format!("Orphan topic '{}' used in {} problems but not defined", topic, n)
    })
}

/// Contest problem references with no matching `(source, external_id)`.
pub fn detect_orphan_problems(contests: &[Value], problems: &[Value]) -> Vec<OrphanError> {
    let defined: HashSet<String> = problems
        .iter()
        .map(|p| format!("{}:{}", str_field(p, "source"), str_field(p, "external_id")))
        .collect();

    let mut usage = Usage::default();
    for contest in contests {
        let source = str_field(contest, "source");
        let refs = contest.get("problems").and_then(Value::as_array);
        for reference in refs.into_iter().flatten() {
            let key = format!("{}:{}", source, str_field(reference, "problem_external_id"));
            if !defined.contains(&key) {
                usage.add(&key, str_field_or_unknown(contest, "contest_id"));
            }
        }
    }
    usage.into_errors(OrphanKind::Problem, |key, n| {
        format!("Orphan problem '{}' referenced in {} contests but not defined", key, n)
    })
}

/// Topic parents that are not themselves defined topics.
pub fn detect_orphan_parents(topics: &[Value]) -> Vec<OrphanError> {
    let defined = topic_names(topics);
    let mut usage = Usage::default();
    for topic in topics {
        let parent = str_field(topic, "parent");
        if !parent.is_empty() && !defined.contains(parent) {
            usage.add(parent, str_field_or_unknown(topic, "name"));
        }
    }
    usage.into_errors(OrphanKind::ParentTopic, |parent, n| {
        format!("Orphan parent topic '{}' referenced by {} topics but not defined", parent, n)
    })
}
