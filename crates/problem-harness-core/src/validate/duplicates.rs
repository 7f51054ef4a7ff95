//! Composite-key duplicate detection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::EntityKind;

/// Records sharing one key. `occurrences` lists every member's identifier
/// in input order, so a key seen N times is one error with N entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateError {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub key: String,
    pub occurrences: Vec<String>,
    pub message: String,
}

/// Fields forming the natural key of each entity kind.
pub fn key_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Problem | EntityKind::Contest => &["source", "external_id"],
        EntityKind::Topic => &["name"],
    }
}

fn key_part(record: &Value, field: &str) -> String {
    match record.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn record_id(record: &Value) -> String {
    ["problem_id", "contest_id", "topic_id"]
        .iter()
        .find_map(|key| record.get(key))
        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Group `items` by key, keeping first-seen key order, and return the
/// groups with more than one member.
fn groups_with_repeats<'a, I>(items: I) -> Vec<(String, Vec<&'a Value>)>
where
    I: IntoIterator<Item = (String, &'a Value)>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Value>)> = Vec::new();
    for (key, record) in items {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }
    groups.retain(|(_, members)| members.len() > 1);
    groups
}

fn composite_key(record: &Value, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| key_part(record, f))
        .collect::<Vec<_>>()
        .join(":")
}

/// Flag every composite key shared by more than one record.
pub fn check_duplicates(records: &[Value], entity_type: &str, fields: &[&str]) -> Vec<DuplicateError> {
    let keyed = records
        .iter()
        .map(|record| (composite_key(record, fields), record));

    groups_with_repeats(keyed)
        .into_iter()
        .map(|(key, members)| {
            let occurrences: Vec<String> = members.iter().map(|r| record_id(r)).collect();
            DuplicateError {
                entity_type: entity_type.to_string(),
                message: format!(
                    "Duplicate {} found: key={}, count={}, ids=[{}]",
                    entity_type,
                    key,
                    occurrences.len(),
                    occurrences.join(", ")
                ),
                key,
                occurrences,
            }
        })
        .collect()
}

pub fn check_kind_duplicates(records: &[Value], kind: EntityKind) -> Vec<DuplicateError> {
    check_duplicates(records, kind.as_str(), key_fields(kind))
}

/// Composite-key duplicates for `kind`, plus identifier duplicates that
/// the composite pass does not already explain.
///
/// Identifiers are derived from the natural key, so records sharing a key
/// also share an identifier. An identifier group is reported only when its
/// members do not all carry the same composite key.
pub fn check_record_duplicates(records: &[Value], kind: EntityKind) -> Vec<DuplicateError> {
    let fields = key_fields(kind);
    let mut errors = check_kind_duplicates(records, kind);

    // Records without an identifier are left to reference validation.

    let keyed = records.iter().filter_map(|record| {
        record
            .get(kind.id_field())
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(|id| (id.to_string(), record))
    });
    for (id, members) in groups_with_repeats(keyed) {
        let first = composite_key(members[0], fields);
        if members.iter().all(|r| composite_key(r, fields) == first) {
            continue;
        }
        errors.push(id_error(id, members.len()));
    }
    errors
}

fn id_error(id: String, count: usize) -> DuplicateError {
    DuplicateError {
        entity_type: "uuid".to_string(),
        message: format!("Duplicate UUID found: {}, count={}", id, count),
        occurrences: vec![id.clone(); count],
        key: id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_two_problems_same_key() {
        let problems = vec![
            json!({"problem_id": "a", "source": "leetcode", "external_id": "1"}),
            json!({"problem_id": "b", "source": "leetcode", "external_id": "1"}),
            json!({"problem_id": "c", "source": "codeforces", "external_id": "1"}),
        ];
        let errors = check_kind_duplicates(&problems, EntityKind::Problem);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].key, "leetcode:1");
        assert_eq!(errors[0].occurrences, vec!["a", "b"]);
        assert_eq!(
            errors[0].message,
            "Duplicate problem found: key=leetcode:1, count=2, ids=[a, b]"
        );
    }

    #[test]
    fn test_three_way_duplicate_is_one_error() {
        let topics: Vec<Value> = ["x", "y", "z"]
            .iter()
            .map(|id| json!({"topic_id": id, "name": "array"}))
            .collect();
        let errors = check_kind_duplicates(&topics, EntityKind::Topic);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].occurrences.len(), 3);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let records = vec![
            json!({"name": "b", "topic_id": "1"}),
            json!({"name": "a", "topic_id": "2"}),
            json!({"name": "a", "topic_id": "3"}),
            json!({"name": "b", "topic_id": "4"}),
        ];
        let keys: Vec<String> = check_duplicates(&records, "topic", &["name"])
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_id_duplicates() {
        let records = vec![
            json!({"contest_id": "same", "source": "codeforces", "external_id": "1"}),
            json!({"contest_id": "same", "source": "codeforces", "external_id": "2"}),
            json!({"contest_id": "", "source": "codeforces", "external_id": "3"}),
            json!({"contest_id": "", "source": "codeforces", "external_id": "4"}),
        ];
        let errors = check_record_duplicates(&records, EntityKind::Contest);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].entity_type, "uuid");
        assert_eq!(errors[0].message, "Duplicate UUID found: same, count=2");
    }

    #[test]
    fn test_shared_key_reported_once() {
        let problems = vec![
            json!({"problem_id": "u1", "source": "leetcode", "external_id": "1"}),
            json!({"problem_id": "u1", "source": "leetcode", "external_id": "1"}),
        ];
        let errors = check_record_duplicates(&problems, EntityKind::Problem);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].entity_type, "problem");
        assert_eq!(errors[0].occurrences, vec!["u1", "u1"]);
    }

    #[test]
    fn test_id_collision_across_keys_still_reported() {
        let problems = vec![
            json!({"problem_id": "u1", "source": "leetcode", "external_id": "1"}),
            json!({"problem_id": "u1", "source": "leetcode", "external_id": "2"}),
        ];
        let errors = check_record_duplicates(&problems, EntityKind::Problem);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].entity_type, "uuid");
        assert_eq!(errors[0].key, "u1");
    }

    #[test]
    fn test_no_duplicates() {
        let records = vec![json!({"name": "a"}), json!({"name": "b"})];
        assert!(check_duplicates(&records, "topic", &["name"]).is_empty());
    }
}
