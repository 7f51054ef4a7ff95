//! Pre-upload gate.
//!
//! Checks that a snapshot is complete and intact before any upload
//! adapter may consume it. The gate only reports; it never uploads.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::snapshot::{ManifestCounts, SnapshotManager, Version, MANIFEST_FILE};

const REQUIRED_FILES: [&str; 2] = ["problems.json", "topics.json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateCheck {
    pub name: String,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GateReport {
    pub version: String,
    pub timestamp: String,
    pub checks: Vec<GateCheck>,
    pub checksum_errors: Vec<String>,
    pub counts: Option<ManifestCounts>,
    pub problem_count: Option<usize>,
    pub all_passed: bool,
}

impl GateReport {
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks.iter().find(|c| c.name == name).map(|c| c.passed)
    }
}

pub struct UploadGate<'a> {
    manager: &'a SnapshotManager,
    version: String,
    snapshot_dir: PathBuf,
}

impl<'a> UploadGate<'a> {
    /// Gate for `version`, or for the latest snapshot when `None`.
    pub fn new(manager: &'a SnapshotManager, version: Option<&str>) -> Result<Self> {
        let version = match version {
            Some(v) => v.parse::<Version>()?.to_string(),
            None => match manager.latest()? {
                Some(info) => info.version,
                None => anyhow::bail!("No snapshots available"),
            },
        };
        Ok(Self {
            snapshot_dir: manager.path_for(&version)?,
            manager,
            version,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn run_checks(&self) -> Result<GateReport> {
        let mut checks = Vec::new();
        let mut record = |name: String, passed: bool| {
            checks.push(GateCheck { name, passed });
        };

        record("snapshot_exists".into(), self.snapshot_dir.is_dir());
        let manifest_exists = self.snapshot_dir.join(MANIFEST_FILE).is_file();
        record("manifest_exists".into(), manifest_exists);
        for file in REQUIRED_FILES {
            record(
                format!("file_exists_{}", file),
                self.snapshot_dir.join(file).is_file(),
            );
        }

        let mut checksum_errors = Vec::new();
        let mut counts = None;
        if manifest_exists {
            let verification = self
                .manager
                .verify(&self.version)
                .with_context(|| format!("Failed to verify snapshot {}", self.version))?;
            record("checksum_valid".into(), verification.valid);
            checksum_errors = verification.errors;
            counts = verification.manifest.map(|m| m.counts);
        } else {
            record("checksum_valid".into(), false);
        }

        let problem_count = fs::read_to_string(self.snapshot_dir.join("problems.json"))
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .and_then(|v| v.as_array().map(Vec::len));
        record("has_problems".into(), problem_count.is_some_and(|n| n > 0));

        let all_passed = checks.iter().all(|c| c.passed);
        if all_passed {
            info!(version = %self.version, "upload gate passed");
        } else {
            warn!(version = %self.version, "upload gate failed");
        }

        Ok(GateReport {
            version: self.version.clone(),
            timestamp: Local::now().to_rfc3339(),
            checks,
            checksum_errors,
            counts,
            problem_count,
            all_passed,
        })
    }
}

/// `ph gate`.
pub fn run_gate(manager: &SnapshotManager, version: Option<&str>) -> Result<GateReport> {
    let gate = UploadGate::new(manager, version)?;
    let report = gate.run_checks()?;

    println!("gate {}", report.version);
    for check in &report.checks {
        println!("  {:<28} {}", check.name, if check.passed { "pass" } else { "FAIL" });
    }
    for err in &report.checksum_errors {
        println!("    - {}", err);
    }
    if let Some(counts) = &report.counts {
        println!(
            "  counts: {} problems, {} topics, {} contests",
            counts.problems,
            counts.topics,
            counts.contests.unwrap_or(0)
        );
    }
    println!("{}", if report.all_passed { "ok" } else { "blocked" });
    Ok(report)
}
