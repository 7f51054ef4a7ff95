//! Platform record → canonical record transformers.
//!
//! Each transformer maps one raw record to an [`Outcome`]: either the
//! canonical document plus any non-fatal warnings, or one or more fatal
//! errors. Batches fold outcomes into [`TransformStats`] and flat error
//! and warning lists; a failed record never stops the batch.
//!
//! Topic accumulation is a reduction over the successful outcomes of a
//! batch. Transformers themselves hold only configuration and can be
//! reused across batches.

pub mod codeforces;
pub mod fields;
pub mod leetcode;

use serde::{Deserialize, Serialize};

pub use codeforces::{rating_to_difficulty, CodeforcesBatch, CodeforcesTransformer};
pub use leetcode::{extract_content, leetcode_records, record_slug, LeetCodeBatch, LeetCodeTransformer};

/// Result of transforming one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Transformed { data: T, warnings: Vec<String> },
    Failed { errors: Vec<String> },
}

impl<T> Outcome<T> {
    pub fn transformed(data: T, warnings: Vec<String>) -> Self {
        Outcome::Transformed { data, warnings }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Outcome::Failed {
            errors: vec![error.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Transformed { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Transformed { data, .. } => Some(data),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Outcome::Transformed { warnings, .. } => warnings,
            Outcome::Failed { .. } => &[],
        }
    }

    pub fn errors(&self) -> &[String] {
        match self {
            Outcome::Transformed { .. } => &[],
            Outcome::Failed { errors } => errors,
        }
    }
}

/// Running counters for one kind of record in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl TransformStats {
    /// Count an outcome. `total` is tracked separately by the caller,
    /// since a batch knows its size before any record is transformed.
    pub fn record<T>(&mut self, outcome: &Outcome<T>) {
        match outcome {
            Outcome::Transformed { warnings, .. } => {
                self.success += 1;
                self.warnings += warnings.len();
            }
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: &TransformStats) {
        self.total += other.total;
        self.success += other.success;
        self.failed += other.failed;
        self.warnings += other.warnings;
    }
}
