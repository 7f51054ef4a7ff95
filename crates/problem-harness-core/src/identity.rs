//! Deterministic identifiers for canonical entities.
//!
//! Every identifier is a name-based UUID (version 5) under a fixed
//! project namespace, hashed over `"{namespace}:{key}"`. The same inputs
//! produce the same identifier in every process and on every run.
//!
//! | Entity | namespace | key |
//! |--------|-----------|-----|
//! | problem | `problem:{source}` | external id |
//! | contest | `contest:{source}` | external id |
//! | topic | `topic` | canonical topic name |
//!
//! # Example
//!
//! ```rust
//! use problem_harness_core::identity::{problem_id, identity};
//! use problem_harness_core::models::Source;
//!
//! let a = problem_id(Source::Leetcode, "1");
//! let b = identity("problem:leetcode", "1");
//! assert_eq!(a, b);
//! ```

use uuid::Uuid;

use crate::models::Source;

/// Project namespace all identifiers are derived under.
pub const NAMESPACE: Uuid = Uuid::from_u128(0xa5ce0d00_0000_4000_8000_000000000000);

/// Derive the identifier for `(namespace, key)`.
///
/// Empty strings are valid inputs.
pub fn identity(namespace: &str, key: &str) -> Uuid {
    let name = format!("{}:{}", namespace, key);
    Uuid::new_v5(&NAMESPACE, name.as_bytes())
}

pub fn problem_id(source: Source, external_id: &str) -> Uuid {
    identity(&format!("problem:{}", source), external_id)
}

pub fn contest_id(source: Source, external_id: &str) -> Uuid {
    identity(&format!("contest:{}", source), external_id)
}

/// Topics are source-agnostic: only the canonical name is hashed.
pub fn topic_id(name: &str) -> Uuid {
    identity("topic", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_constant() {
        assert_eq!(
            NAMESPACE.to_string(),
            "a5ce0d00-0000-4000-8000-000000000000"
        );
    }

    #[test]
    fn test_identity_is_deterministic() {
        let a = identity("problem:leetcode", "1");
        let b = identity("problem:leetcode", "1");
        assert_eq!(a, b);
        assert_eq!(a.get_version_num(), 5);
    }

    #[test]
    fn test_identity_matches_reference_v5() {
        // Same derivation any other UUIDv5 implementation performs.
        let expected = Uuid::new_v5(&NAMESPACE, b"topic:array");
        assert_eq!(topic_id("array"), expected);
    }

    #[test]
    fn test_wrappers_use_distinct_namespaces() {
        let p = problem_id(Source::Codeforces, "100-A");
        let c = contest_id(Source::Codeforces, "100-A");
        let other_source = problem_id(Source::Leetcode, "100-A");
        assert_ne!(p, c);
        assert_ne!(p, other_source);
    }

    #[test]
    fn test_empty_inputs_are_valid() {
        let id = identity("", "");
        assert_eq!(id, identity("", ""));
        assert!(Uuid::parse_str(&id.to_string()).is_ok());
    }
}
