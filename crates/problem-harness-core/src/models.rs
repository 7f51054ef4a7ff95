//! Canonical data models shared by every pipeline stage.
//!
//! These are the platform-independent records produced by the
//! transformers, written to `problems.json` / `contests.json` /
//! `topics.json`, and frozen into snapshots. Field order here is the
//! field order on disk.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Upstream platform a record was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Leetcode,
    Codeforces,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Leetcode => "leetcode",
            Source::Codeforces => "codeforces",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized difficulty bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic category. Unmapped topics fall into [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "dsa")]
    Dsa,
    #[serde(rename = "cp")]
    Cp,
    #[serde(rename = "system-design")]
    SystemDesign,
    #[serde(rename = "other")]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dsa => "dsa",
            Category::Cp => "cp",
            Category::SystemDesign => "system-design",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-specific key-value bag attached to a [`Problem`].
///
/// The optional engagement fields are copied verbatim from the raw
/// record and omitted entirely when the raw record does not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemMetadata {
    pub frontend_id: Option<String>,
    pub contest_index: Option<String>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_rate: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Value>,
}

/// External storage locations for problem content. `None` means the
/// content is not available for this problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRefs {
    pub description_path: Option<String>,
    pub examples_path: Option<String>,
    pub constraints_path: Option<String>,
}

impl ContentRefs {
    /// All three paths null.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// `(field name, path)` pairs in a fixed order.
    pub fn entries(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("description_path", self.description_path.as_deref()),
            ("examples_path", self.examples_path.as_deref()),
            ("constraints_path", self.constraints_path.as_deref()),
        ]
    }
}

/// A normalized programming problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub problem_id: String,
    pub source: Source,
    pub external_id: String,
    pub slug: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub rating: Option<i64>,
    pub metadata: ProblemMetadata,
    pub topics: Vec<String>,
    pub content_refs: ContentRefs,
}

/// Reference from a contest to one of its problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestProblemRef {
    pub problem_external_id: String,
    pub index: String,
}

/// Contest formats the platform documents. Anything else is kept
/// verbatim on the [`Contest`] and reported as a warning.
pub const KNOWN_CONTEST_TYPES: [&str; 3] = ["CF", "ICPC", "IOI"];

/// A competition grouping problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub contest_id: String,
    pub source: Source,
    pub external_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub contest_type: String,
    pub duration_seconds: i64,
    pub start_time: Option<i64>,
    pub phase: String,
    pub problems: Vec<ContestProblemRef>,
}

/// A canonical, source-agnostic tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: String,
    pub name: String,
    pub parent: Option<String>,
    pub category: Category,
}

/// The three canonical entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Problem,
    Contest,
    Topic,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Problem, EntityKind::Contest, EntityKind::Topic];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Problem => "problem",
            EntityKind::Contest => "contest",
            EntityKind::Topic => "topic",
        }
    }

    /// Name of the primary identifier field.
    pub fn id_field(&self) -> &'static str {
        match self {
            EntityKind::Problem => "problem_id",
            EntityKind::Contest => "contest_id",
            EntityKind::Topic => "topic_id",
        }
    }

    /// Canonical collection file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            EntityKind::Problem => "problems.json",
            EntityKind::Contest => "contests.json",
            EntityKind::Topic => "topics.json",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Source::Codeforces).unwrap(), "\"codeforces\"");
        assert_eq!(serde_json::to_string(&Difficulty::Hard).unwrap(), "\"hard\"");
        assert_eq!(
            serde_json::to_string(&Category::SystemDesign).unwrap(),
            "\"system-design\""
        );
    }

    #[test]
    fn test_contest_type_field_renamed() {
        let contest = Contest {
            contest_id: "id".into(),
            source: Source::Codeforces,
            external_id: "1".into(),
            name: "Round".into(),
            contest_type: "CF".into(),
            duration_seconds: 7200,
            start_time: None,
            phase: "FINISHED".into(),
            problems: vec![],
        };
        let value = serde_json::to_value(&contest).unwrap();
        assert_eq!(value["type"], "CF");
        assert!(value.get("contest_type").is_none());
        assert!(value["start_time"].is_null());
    }

    #[test]
    fn test_metadata_omits_absent_optional_fields() {
        let meta = ProblemMetadata {
            frontend_id: None,
            contest_index: Some("A".into()),
            source_url: "https://codeforces.com/problemset/problem/1/A".into(),
            points: None,
            is_premium: None,
            accept_rate: None,
            likes: None,
            dislikes: None,
        };
        let value = serde_json::to_value(&meta).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert!(obj["frontend_id"].is_null());
    }
}
