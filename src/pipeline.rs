//! Normalize → Validate → Snapshot orchestration.
//!
//! Each stage is gated on the previous one:
//!
//! - **normalize** fails when no problem or contest was produced.
//! - **validate** is skipped after a failed normalization. It always reads
//!   the canonical files back from disk. A report with errors fails the
//!   stage (the data was rejected); warnings alone do not.
//! - **snapshot** is skipped on a dry run or when validation did not pass,
//!   with the reason recorded as a pipeline warning.
//!
//! An error escaping a stage is recorded as that stage's failure and halts
//! the stages after it. The pipeline succeeds when no stage failed.

use anyhow::Result;
use problem_harness_core::validate::ValidationReport;
use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::normalize::{run_normalize, NormalizationStats, SourceSelection};
use crate::snapshot::{Manifest, SnapshotManager};
use crate::validation::{run_validate, ValidateOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Normalize,
    Validate,
    Snapshot,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Normalize => "normalize",
            Stage::Validate => "validate",
            Stage::Snapshot => "snapshot",
        })
    }
}

/// `--step` selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StepSelection {
    #[default]
    All,
    Normalize,
    Validate,
    Snapshot,
}

impl StepSelection {
    pub fn stages(&self) -> Vec<Stage> {
        match self {
            StepSelection::All => vec![Stage::Normalize, Stage::Validate, Stage::Snapshot],
            StepSelection::Normalize => vec![Stage::Normalize],
            StepSelection::Validate => vec![Stage::Validate],
            StepSelection::Snapshot => vec![Stage::Snapshot],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageOutcome {
    Completed,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub steps: StepSelection,
    pub dry_run: bool,
    pub schema_version: Option<String>,
    pub snapshot_version: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    pub stages: Vec<(Stage, StageOutcome)>,
    pub normalization: Option<NormalizationStats>,
    pub validation: Option<ValidationReport>,
    pub snapshot: Option<Manifest>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl PipelineResult {
    pub fn success(&self) -> bool {
        !self
            .stages
            .iter()
            .any(|(_, outcome)| matches!(outcome, StageOutcome::Failed { .. }))
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }

    fn halted(&self) -> bool {
        !self.success()
    }

    fn complete(&mut self, stage: Stage) {
        info!(%stage, "stage completed");
        self.stages.push((stage, StageOutcome::Completed));
    }

    fn skip(&mut self, stage: Stage, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(%stage, %reason, "stage skipped");
        self.warnings.push(format!("{} skipped: {}", stage, reason));
        self.stages.push((stage, StageOutcome::Skipped { reason }));
    }

    fn fail(&mut self, stage: Stage, err: impl Into<String>) {
        let err = err.into();
        error!(%stage, error = %err, "stage failed");
        self.errors.push(format!("{} failed: {}", stage, err));
        self.stages.push((stage, StageOutcome::Failed { error: err }));
    }
}

/// Run the selected stages. Stage errors are captured in the result;
/// `Err` is reserved for failures outside any stage.
pub fn run_pipeline(config: &Config, opts: &PipelineOptions) -> Result<PipelineResult> {
    let stages = opts.steps.stages();
    let schema_version = opts
        .schema_version
        .clone()
        .unwrap_or_else(|| config.validation.schema_version.clone());
    let mut result = PipelineResult::default();

    info!(?stages, dry_run = opts.dry_run, %schema_version, "pipeline started");

    if stages.contains(&Stage::Normalize) {
        match run_normalize(config, SourceSelection::All, opts.dry_run, false) {
            Ok(normalization) => {
                result.normalization = Some(normalization.stats());
                result.errors.extend(normalization.errors());
                result.warnings.extend(normalization.warnings.iter().cloned());
                if normalization.produced_records() {
                    result.complete(Stage::Normalize);
                } else {
                    result.fail(Stage::Normalize, "no problems or contests were produced");
                }
            }
            Err(e) => result.fail(Stage::Normalize, format!("{:#}", e)),
        }
    }

    if stages.contains(&Stage::Validate) {
        if result.halted() {
            result.skip(Stage::Validate, "an earlier stage failed");
        } else {
            let validate_opts = ValidateOptions {
                input_dir: None,
                schema_version: Some(schema_version.clone()),
                strict: false,
                save_report: false,
            };
            match run_validate(config, &validate_opts) {
                Ok(report) => {
                    let valid = report.is_valid;
                    let total = report.total_errors;
                    result.validation = Some(report);
                    if valid {
                        result.complete(Stage::Validate);
                    } else if total > 0 {
                        result.fail(Stage::Validate, format!("{} validation errors", total));
                    } else {
                        result.fail(Stage::Validate, "validation did not pass");
                    }
                }
                Err(e) => result.fail(Stage::Validate, format!("{:#}", e)),
            }
        }
    }

    if stages.contains(&Stage::Snapshot) {
        if opts.dry_run {
            result.skip(Stage::Snapshot, "dry run");
        } else if result.halted() {
            result.skip(Stage::Snapshot, "validation did not pass");
        } else {
            match create_snapshot(config, opts, &schema_version) {
                Ok(manifest) => {
                    result.snapshot = Some(manifest);
                    result.complete(Stage::Snapshot);
                }
                Err(e) => result.fail(Stage::Snapshot, format!("{:#}", e)),
            }
        }
    }

    print_summary(&result);
    Ok(result)
}

fn create_snapshot(config: &Config, opts: &PipelineOptions, schema_version: &str) -> Result<Manifest> {
    let manager = SnapshotManager::new(&config.paths.validated_dir);
    let version = match &opts.snapshot_version {
        Some(v) => v.clone(),
        None => manager.next_version(config.snapshot.default_bump)?.to_string(),
    };
    let manifest = manager.create(
        &version,
        &config.paths.output_dir,
        schema_version,
        opts.notes.as_deref(),
        false,
    )?;
    println!("snapshot {}", manifest.version);
    println!("  problems: {}", manifest.counts.problems);
    println!("  topics: {}", manifest.counts.topics);
    println!("  contests: {}", manifest.counts.contests.unwrap_or(0));
    Ok(manifest)
}

fn print_summary(result: &PipelineResult) {
    println!("pipeline");
    for (stage, outcome) in &result.stages {
        match outcome {
            StageOutcome::Completed => println!("  {}: completed", stage),
            StageOutcome::Skipped { reason } => println!("  {}: skipped ({})", stage, reason),
            StageOutcome::Failed { error } => println!("  {}: FAILED ({})", stage, error),
        }
    }
    if !result.errors.is_empty() {
        println!("  errors: {}", result.errors.len());
    }
    if !result.warnings.is_empty() {
        println!("  warnings: {}", result.warnings.len());
    }
    println!("{}", if result.success() { "ok" } else { "failed" });
}
