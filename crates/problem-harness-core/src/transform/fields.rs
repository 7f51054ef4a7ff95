//! Named field-candidate lists for raw platform records.
//!
//! Platform payloads spell the same attribute differently across API
//! versions (`questionId` vs `problem_id`). Each logical attribute is a
//! [`Field`] with an ordered candidate list; the first candidate holding a
//! present value wins.
//!
//! A value is *present* unless it is `null`, `false`, `0`, `""`, `[]` or
//! `{}`. Empty values fall through to the next candidate. Identity keys are
//! the exception: there `0` is a real identifier and only `null`, `""` or a
//! missing key count as absent.

use serde_json::Value;

/// One logical attribute and the raw keys it may be stored under.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
}

impl Field {
    pub const fn new(name: &'static str, candidates: &'static [&'static str]) -> Self {
        Self { name, candidates }
    }

    /// First present value among the candidates.
    pub fn resolve<'a>(&self, raw: &'a Value) -> Option<&'a Value> {
        self.candidates
            .iter()
            .filter_map(|key| raw.get(key))
            .find(|value| is_present(value))
    }

    /// First candidate whose value renders as non-empty text.
    pub fn text(&self, raw: &Value) -> Option<String> {
        self.candidates
            .iter()
            .filter_map(|key| raw.get(key))
            .find_map(as_text)
    }

    /// Like [`Field::text`], but numeric zero counts as a value.
    pub fn identity(&self, raw: &Value) -> Option<String> {
        self.candidates
            .iter()
            .filter_map(|key| raw.get(key))
            .find_map(identity_text)
    }
}

pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Strings as-is, numbers in their JSON spelling, everything else absent.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if is_present(value) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier text: non-empty strings and any number, including `0`.
pub fn identity_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier under a single key, with no fallback.
pub fn identity_of(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(identity_text)
}

/// Text of a single key, with no fallback.
pub fn text_of(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(as_text)
}

/// Array under `key`, or empty.
pub fn array_of<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
