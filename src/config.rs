//! TOML configuration.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration. Relative paths are resolved against the directory that
//! contains the configuration file.
//!
//! ```toml
//! [paths]
//! leetcode_input = "data/leetcode/merged_problems.json"
//! codeforces_dir = "data/codeforces"
//! output_dir     = "output"
//! validated_dir  = "validated"
//! rejected_dir   = "rejected"
//! schemas_dir    = "schemas"
//!
//! [content]
//! leetcode_base = "r2://problems/leetcode"
//!
//! [validation]
//! schema_version        = "v1.0.0"
//! strict                = false
//! save_rejection_report = true
//!
//! [snapshot]
//! default_bump = "patch"
//! ```

use anyhow::{Context, Result};
use problem_harness_core::transform::leetcode::DEFAULT_CONTENT_BASE;
use problem_harness_core::validate::references::is_storage_path;
use problem_harness_core::validate::schema::BUILTIN_VERSION;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::snapshot::{Bump, Version};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_leetcode_input")]
    pub leetcode_input: PathBuf,
    #[serde(default = "default_codeforces_dir")]
    pub codeforces_dir: PathBuf,
    /// Canonical `problems.json` / `contests.json` / `topics.json`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Snapshot root, one `vX.Y.Z` directory per snapshot.
    #[serde(default = "default_validated_dir")]
    pub validated_dir: PathBuf,
    #[serde(default = "default_rejected_dir")]
    pub rejected_dir: PathBuf,
    /// Optional on-disk schema store, `{schemas_dir}/{version}/*.schema.json`.
    #[serde(default = "default_schemas_dir")]
    pub schemas_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            leetcode_input: default_leetcode_input(),
            codeforces_dir: default_codeforces_dir(),
            output_dir: default_output_dir(),
            validated_dir: default_validated_dir(),
            rejected_dir: default_rejected_dir(),
            schemas_dir: default_schemas_dir(),
        }
    }
}

fn default_leetcode_input() -> PathBuf {
    PathBuf::from("data/leetcode/merged_problems.json")
}
fn default_codeforces_dir() -> PathBuf {
    PathBuf::from("data/codeforces")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_validated_dir() -> PathBuf {
    PathBuf::from("validated")
}
fn default_rejected_dir() -> PathBuf {
    PathBuf::from("rejected")
}
fn default_schemas_dir() -> PathBuf {
    PathBuf::from("schemas")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    #[serde(default = "default_leetcode_base")]
    pub leetcode_base: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            leetcode_base: default_leetcode_base(),
        }
    }
}

fn default_leetcode_base() -> String {
    DEFAULT_CONTENT_BASE.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_save_rejection_report")]
    pub save_rejection_report: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            strict: false,
            save_rejection_report: true,
        }
    }
}

fn default_schema_version() -> String {
    BUILTIN_VERSION.to_string()
}
fn default_save_rejection_report() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub default_bump: Bump,
}

impl PathsConfig {
    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.leetcode_input,
            &mut self.codeforces_dir,
            &mut self.output_dir,
            &mut self.validated_dir,
            &mut self.rejected_dir,
            &mut self.schemas_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Parse and validate configuration text. Relative paths are joined onto
/// `base_dir`.
pub fn parse_config(content: &str, base_dir: &Path) -> Result<Config> {
    let mut config: Config =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.validation.schema_version.parse::<Version>().is_err() {
        anyhow::bail!(
            "validation.schema_version must look like vX.Y.Z, got '{}'",
            config.validation.schema_version
        );
    }

    let base = config.content.leetcode_base.trim_end_matches('/');
    if !is_storage_path(&format!("{}/probe", base)) {
        anyhow::bail!(
            "content.leetcode_base must be an r2://bucket/path location, got '{}'",
            config.content.leetcode_base
        );
    }

    config.paths.resolve_against(base_dir);
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_config(&content, base_dir)
}
