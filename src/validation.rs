//! Validation runner and rejection reports.
//!
//! Loads the canonical collections back from disk, validates them with the
//! schema set chosen for the run, prints a summary and, when validation
//! fails, can write a rejection report:
//!
//! ```text
//! {rejected_dir}/{schema_version}_{YYYYmmdd_HHMMSS}/
//!     errors.json   full ValidationReport
//!     errors.log    one line per finding
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use problem_harness_core::models::EntityKind;
use problem_harness_core::validate::{SchemaSet, SchemaStore, ValidationReport, Validator};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::normalize::save_json;

/// The three canonical collections as loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub problems: Vec<Value>,
    pub contests: Vec<Value>,
    pub topics: Vec<Value>,
}

impl Collections {
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty() && self.contests.is_empty() && self.topics.is_empty()
    }
}

fn load_array(path: &Path) -> Result<Vec<Value>> {
    if !path.is_file() {
        debug!(path = %path.display(), "collection file missing; treating as empty");
        return Ok(Vec::new());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str::<Value>(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?
    {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        _ => anyhow::bail!("{} must contain a JSON array", path.display()),
    }
}

/// Load `problems.json`, `contests.json` and `topics.json` from `dir`.
/// Missing files load as empty collections.
pub fn load_collections(dir: &Path) -> Result<Collections> {
    Ok(Collections {
        problems: load_array(&dir.join(EntityKind::Problem.file_name()))?,
        contests: load_array(&dir.join(EntityKind::Contest.file_name()))?,
        topics: load_array(&dir.join(EntityKind::Topic.file_name()))?,
    })
}

/// Built-in schema sets plus every complete version directory under
/// `schemas_dir`. On-disk sets replace built-in ones of the same version.
pub fn load_schema_store(schemas_dir: &Path) -> Result<SchemaStore> {
    let mut store = SchemaStore::builtin().context("Built-in schemas are malformed")?;
    if !schemas_dir.is_dir() {
        return Ok(store);
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(schemas_dir)
        .with_context(|| format!("Failed to read {}", schemas_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        let Some(version) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let read = |kind: EntityKind| -> Option<String> {
            fs::read_to_string(dir.join(format!("{}.schema.json", kind.as_str()))).ok()
        };
        let (Some(problem), Some(contest), Some(topic)) = (
            read(EntityKind::Problem),
            read(EntityKind::Contest),
            read(EntityKind::Topic),
        ) else {
            warn!(%version, "incomplete schema directory; skipping");
            continue;
        };
        let set = SchemaSet::from_sources(&version, &problem, &contest, &topic)
            .with_context(|| format!("Failed to load schemas from {}", dir.display()))?;
        debug!(%version, "loaded schema set from disk");
        store.insert(set);
    }
    Ok(store)
}

/// Validate loaded collections. An entirely empty input is invalid.
pub fn validate_collections(
    collections: &Collections,
    store: &SchemaStore,
    schema_version: &str,
    strict: bool,
) -> ValidationReport {
    if collections.is_empty() {
        warn!("no data files found to validate");
        return ValidationReport {
            is_valid: false,
            warnings: vec!["No data files found".to_string()],
            ..Default::default()
        };
    }
    Validator::for_version(store, schema_version)
        .strict(strict)
        .validate_all(
            &collections.problems,
            &collections.contests,
            &collections.topics,
        )
}

/// Flat, human-readable listing of every finding.
pub fn render_error_log(report: &ValidationReport, generated_at: &str) -> String {
    let mut lines = vec![
        format!("Validation Failed: {}", generated_at),
        format!("Total Errors: {}", report.total_errors),
        format!("Schema Errors: {}", report.schema_errors.len()),
        format!("Duplicate Errors: {}", report.duplicate_errors.len()),
        format!("Orphan Errors: {}", report.orphan_errors.len()),
        format!("Reference Errors: {}", report.reference_errors.len()),
        String::new(),
        "=== ERRORS ===".to_string(),
    ];
    for err in &report.schema_errors {
        lines.push(format!(
            "[SCHEMA] [{} {}] {}: {}",
            err.entity_type.as_str(),
            err.entity_id,
            if err.path.is_empty() { "<root>" } else { err.path.as_str() },
            err.message
        ));
    }
    for err in &report.duplicate_errors {
        lines.push(format!("[DUPLICATE] {}", err.message));
    }
    for err in &report.orphan_errors {
        lines.push(format!("[ORPHAN] {}", err.message));
    }
    for err in &report.reference_errors {
        lines.push(format!("[REFERENCE] {}", err.message));
    }
    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.push("=== WARNINGS ===".to_string());
        lines.extend(report.warnings.iter().map(|w| format!("[WARNING] {}", w)));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write `errors.json` and `errors.log` to a fresh rejection directory and
/// return its path.
pub fn save_rejection_report(
    report: &ValidationReport,
    schema_version: &str,
    rejected_dir: &Path,
) -> Result<PathBuf> {
    let now = Local::now();
    let dir = rejected_dir.join(format!("{}_{}", schema_version, now.format("%Y%m%d_%H%M%S")));
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    save_json(report, &dir.join("errors.json"))?;
    let log = render_error_log(report, &now.to_rfc3339());
    fs::write(dir.join("errors.log"), log)
        .with_context(|| format!("Failed to write {}", dir.join("errors.log").display()))?;

    info!(path = %dir.display(), "rejection report saved");
    Ok(dir)
}

fn print_details<T>(title: &str, items: &[T], line: impl Fn(&T) -> String) {
    if items.is_empty() {
        return;
    }
    println!("  {} (first {}):", title, items.len().min(10));
    for item in items.iter().take(10) {
        println!("    - {}", line(item));
    }
}

/// Print the category counts and up to ten details per category.
pub fn print_report(report: &ValidationReport) {
    println!("  schema errors: {}", report.schema_errors.len());
    println!("  duplicate errors: {}", report.duplicate_errors.len());
    println!("  orphan errors: {}", report.orphan_errors.len());
    println!("  reference errors: {}", report.reference_errors.len());
    println!("  warnings: {}", report.warnings.len());
    println!("  total errors: {}", report.total_errors);

    print_details("schema errors", &report.schema_errors, |e| {
        format!("[{}] {}: {}", e.entity_id, e.path, e.message)
    });
    print_details("duplicate errors", &report.duplicate_errors, |e| e.message.clone());
    print_details("orphan errors", &report.orphan_errors, |e| e.message.clone());
    print_details("reference errors", &report.reference_errors, |e| {
        format!("[{}] {}", e.record_id, e.message)
    });
    print_details("warnings", &report.warnings, |w| w.clone());
}

/// Options for [`run_validate`]; unset values come from the config.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub input_dir: Option<PathBuf>,
    pub schema_version: Option<String>,
    pub strict: bool,
    pub save_report: bool,
}

/// `ph validate`.
pub fn run_validate(config: &Config, opts: &ValidateOptions) -> Result<ValidationReport> {
    let input_dir = opts
        .input_dir
        .clone()
        .unwrap_or_else(|| config.paths.output_dir.clone());
    let schema_version = opts
        .schema_version
        .clone()
        .unwrap_or_else(|| config.validation.schema_version.clone());
    let strict = opts.strict || config.validation.strict;

    let collections = load_collections(&input_dir)?;
    let store = load_schema_store(&config.paths.schemas_dir)?;

    println!("validate {}", input_dir.display());
    println!("  schema version: {}", schema_version);
    println!("  strict: {}", strict);
    println!(
        "  loaded: {} problems, {} contests, {} topics",
        collections.problems.len(),
        collections.contests.len(),
        collections.topics.len()
    );

    let report = validate_collections(&collections, &store, &schema_version, strict);
    print_report(&report);

    if !report.is_valid && (opts.save_report || config.validation.save_rejection_report) {
        let dir = save_rejection_report(&report, &schema_version, &config.paths.rejected_dir)?;
        println!("  rejection report: {}", dir.display());
    }

    println!("{}", if report.is_valid { "ok" } else { "invalid" });
    Ok(report)
}
