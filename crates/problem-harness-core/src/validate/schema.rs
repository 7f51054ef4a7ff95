//! Versioned structural schemas and the checker strategy built on them.
//!
//! Schemas are JSON Schema draft 7 documents compiled with the
//! `jsonschema` crate, one validator per entity kind. `format: "uuid"` is
//! registered as a custom format since draft 7 does not define it.
//! The `v1.0.0` set is compiled into the crate; further versions can be
//! added to a [`SchemaStore`] at runtime.
//!
//! A [`SchemaChecker`] is chosen once per validation run: structural when
//! the requested version is in the store, required-field presence when it
//! is not.

use jsonschema::{Draft, JSONSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::models::EntityKind;

pub const BUILTIN_VERSION: &str = "v1.0.0";

const BUILTIN_PROBLEM: &str = include_str!("../../schemas/v1.0.0/problem.schema.json");
const BUILTIN_CONTEST: &str = include_str!("../../schemas/v1.0.0/contest.schema.json");
const BUILTIN_TOPIC: &str = include_str!("../../schemas/v1.0.0/topic.schema.json");

#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("{kind} schema for {version} is not valid JSON: {source}")]
    Json {
        version: String,
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} schema for {version} is malformed at '{path}': {message}")]
    Malformed {
        version: String,
        kind: EntityKind,
        path: String,
        message: String,
    },
}

/// One schema violation found in an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaError {
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub path: String,
    pub message: String,
    pub schema_path: String,
}

/// Render a JSON pointer (`/topics/1`) as a dotted path (`topics.1`).
fn dotted(pointer: impl fmt::Display) -> String {
    pointer.to_string().trim_start_matches('/').replace('/', ".")
}

fn is_uuid(value: &str) -> bool {
    uuid::Uuid::parse_str(value).is_ok()
}

fn compile(version: &str, kind: EntityKind, text: &str) -> Result<JSONSchema, SchemaLoadError> {
    let document: Value = serde_json::from_str(text).map_err(|source| SchemaLoadError::Json {
        version: version.to_string(),
        kind,
        source,
    })?;
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .with_format("uuid", is_uuid)
        .compile(&document)
        .map_err(|e| SchemaLoadError::Malformed {
            version: version.to_string(),
            kind,
            path: dotted(&e.schema_path),
            message: e.to_string(),
        });
    compiled
}

/// The three compiled entity schemas of one version.
#[derive(Clone)]
pub struct SchemaSet {
    pub version: String,
    problem: Arc<JSONSchema>,
    contest: Arc<JSONSchema>,
    topic: Arc<JSONSchema>,
}

impl fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSet").field("version", &self.version).finish_non_exhaustive()
    }
}

impl SchemaSet {
    /// Compile a set from the raw text of its three schema documents.
    pub fn from_sources(
        version: &str,
        problem: &str,
        contest: &str,
        topic: &str,
    ) -> Result<Self, SchemaLoadError> {
        Ok(Self {
            version: version.to_string(),
            problem: Arc::new(compile(version, EntityKind::Problem, problem)?),
            contest: Arc::new(compile(version, EntityKind::Contest, contest)?),
            topic: Arc::new(compile(version, EntityKind::Topic, topic)?),
        })
    }

    pub fn get(&self, kind: EntityKind) -> &JSONSchema {
        match kind {
            EntityKind::Problem => &self.problem,
            EntityKind::Contest => &self.contest,
            EntityKind::Topic => &self.topic,
        }
    }
}

/// Version-indexed schema sets.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    sets: BTreeMap<String, SchemaSet>,
}

impl SchemaStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store holding the compiled-in `v1.0.0` set.
    pub fn builtin() -> Result<Self, SchemaLoadError> {
        let mut store = Self::empty();
        store.insert(SchemaSet::from_sources(
            BUILTIN_VERSION,
            BUILTIN_PROBLEM,
            BUILTIN_CONTEST,
            BUILTIN_TOPIC,
        )?);
        Ok(store)
    }

    /// Add or replace the set for its version.
    pub fn insert(&mut self, set: SchemaSet) {
        self.sets.insert(set.version.clone(), set);
    }

    pub fn get(&self, version: &str) -> Option<&SchemaSet> {
        self.sets.get(version)
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }
}

/// Required fields checked when no schema set is available.
pub fn required_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Problem => &["problem_id", "source", "external_id", "slug", "title", "difficulty"],
        EntityKind::Contest => &["contest_id", "source", "external_id", "name", "type", "problems"],
        EntityKind::Topic => &["topic_id", "name", "category"],
    }
}

/// Identifier used to attribute a schema error to its entity.
pub fn entity_label(entity: &Value) -> String {
    ["problem_id", "contest_id", "topic_id", "name"]
        .iter()
        .filter_map(|key| entity.get(key))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
        .unwrap_or("unknown")
        .to_string()
}

/// Schema checking strategy, selected once per run.
#[derive(Debug, Clone)]
pub enum SchemaChecker {
    Structural(SchemaSet),
    RequiredFields,
}

impl SchemaChecker {
    /// Structural checker for `version` if the store has it, otherwise
    /// the required-field fallback.
    pub fn select(store: &SchemaStore, version: &str) -> Self {
        match store.get(version) {
            Some(set) => SchemaChecker::Structural(set.clone()),
            None => {
                warn!(version, "schema version not found; falling back to required-field checks");
                SchemaChecker::RequiredFields
            }
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, SchemaChecker::Structural(_))
    }

    pub fn check(&self, kind: EntityKind, entity: &Value) -> Vec<SchemaError> {
        let label = entity_label(entity);
        let error = |path: String, message: String, schema_path: String| SchemaError {
            entity_type: kind,
            entity_id: label.clone(),
            path,
            message,
            schema_path,
        };

        match self {
            SchemaChecker::Structural(set) => match set.get(kind).validate(entity) {
                Ok(()) => Vec::new(),
                Err(violations) => violations
                    .map(|v| error(dotted(&v.instance_path), v.to_string(), dotted(&v.schema_path)))
                    .collect(),
            },
            SchemaChecker::RequiredFields => required_fields(kind)
                .iter()
                .filter(|field| entity.get(**field).map_or(true, Value::is_null))
                .map(|field| {
                    error(
                        field.to_string(),
                        format!("Missing required field: {}", field),
                        "required".to_string(),
                    )
                })
                .collect(),
        }
    }
}
