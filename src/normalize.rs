//! Normalization runner: raw platform files → canonical JSON files.
//!
//! Each source is transformed independently. A source whose input is
//! missing is skipped with a warning; the other source still runs. The
//! merged topic list is derived from the union of every problem's
//! normalized topics.
//!
//! Output files (in `paths.output_dir`):
//!
//! | Selection | Files |
//! |-----------|-------|
//! | `leetcode` | `leetcode_problems.json`, `leetcode_topics.json` |
//! | `codeforces` | `codeforces_problems.json`, `codeforces_contests.json`, `codeforces_topics.json` |
//! | `all` | `problems.json`, `contests.json`, `topics.json`, `normalization_report.json` |

use anyhow::{Context, Result};
use chrono::Local;
use problem_harness_core::models::{Contest, Problem, Topic};
use problem_harness_core::topics::build_topic_documents;
use problem_harness_core::transform::{
    extract_content, leetcode_records, record_slug, CodeforcesBatch, CodeforcesTransformer,
    LeetCodeBatch, LeetCodeTransformer, TransformStats,
};
use problem_harness_core::validate::references::is_slug;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::sources::codeforces_files;

/// Which sources a normalization run covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceSelection {
    #[default]
    All,
    Leetcode,
    Codeforces,
}

impl SourceSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSelection::All => "all",
            SourceSelection::Leetcode => "leetcode",
            SourceSelection::Codeforces => "codeforces",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CodeforcesStats {
    pub problems: TransformStats,
    pub contests: TransformStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationStats {
    pub leetcode: Option<TransformStats>,
    pub codeforces: Option<CodeforcesStats>,
    pub total_problems: usize,
    pub total_contests: usize,
    pub total_topics: usize,
}

/// Merged output of a normalization run.
#[derive(Debug, Clone, Default)]
pub struct Normalization {
    pub leetcode: Option<LeetCodeBatch>,
    pub codeforces: Option<CodeforcesBatch>,
    pub problems: Vec<Problem>,
    pub contests: Vec<Contest>,
    pub topics: Vec<Topic>,
    /// Sources that were skipped, and why.
    pub warnings: Vec<String>,
    /// Raw LeetCode document, kept for content export.
    leetcode_document: Option<Value>,
}

impl Normalization {
    pub fn stats(&self) -> NormalizationStats {
        NormalizationStats {
            leetcode: self.leetcode.as_ref().map(|b| b.stats),
            codeforces: self.codeforces.as_ref().map(|b| CodeforcesStats {
                problems: b.problem_stats,
                contests: b.contest_stats,
            }),
            total_problems: self.problems.len(),
            total_contests: self.contests.len(),
            total_topics: self.topics.len(),
        }
    }

    pub fn errors(&self) -> Vec<String> {
        let lc = self.leetcode.iter().flat_map(|b| b.errors.as_slice());
        let cf = self.codeforces.iter().flat_map(|b| b.errors.as_slice());
        lc.chain(cf).cloned().collect()
    }

    /// At least one problem or contest came out of the run.
    pub fn produced_records(&self) -> bool {
        !self.problems.is_empty() || !self.contests.is_empty()
    }
}

#[derive(Serialize)]
struct PerSource<T> {
    leetcode: T,
    codeforces: T,
}

#[derive(Serialize)]
struct NormalizationReport<'a> {
    timestamp: String,
    stats: NormalizationStats,
    errors: PerSource<&'a [String]>,
    warnings: PerSource<&'a [String]>,
}

/// Write `data` as pretty-printed UTF-8 JSON. Non-ASCII characters are
/// written literally.
pub fn save_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(data)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Transform the LeetCode input file. `Ok(None)` when the file does not
/// exist.
pub fn normalize_leetcode(config: &Config) -> Result<Option<(LeetCodeBatch, Value)>> {
    let path = &config.paths.leetcode_input;
    if !path.is_file() {
        warn!(path = %path.display(), "leetcode input not found; skipping");
        return Ok(None);
    }
    let document = read_json(path)?;
    let transformer = LeetCodeTransformer::new(config.content.leetcode_base.as_str());
    let batch = transformer.transform_document(&document);
    info!(
        total = batch.stats.total,
        success = batch.stats.success,
        failed = batch.stats.failed,
        "leetcode normalized"
    );
    Ok(Some((batch, document)))
}

/// Transform every contest file in the Codeforces directory. A file that
/// cannot be read or parsed is recorded as a failed contest and the rest
/// of the directory is still processed. `Ok(None)` when the directory does
/// not exist.
pub fn normalize_codeforces(config: &Config) -> Result<Option<CodeforcesBatch>> {
    let dir = &config.paths.codeforces_dir;
    if !dir.is_dir() {
        warn!(path = %dir.display(), "codeforces input not found; skipping");
        return Ok(None);
    }

    let transformer = CodeforcesTransformer::new();
    let mut batch = CodeforcesBatch::default();
    for path in codeforces_files(dir)? {
        let tag = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let part = match read_json(&path) {
            Ok(document) => transformer.transform_document(&tag, &document),
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(file = %tag, error = %reason, "unreadable contest file");
                CodeforcesBatch::unreadable(&tag, reason)
            }
        };
        batch = batch.merge(part);
    }
    let batch = batch.finish();
    info!(
        problems = batch.problem_stats.success,
        contests = batch.contest_stats.success,
        failed_problems = batch.problem_stats.failed,
        failed_contests = batch.contest_stats.failed,
        "codeforces normalized"
    );
    Ok(Some(batch))
}

/// Run the selected transformers and merge their output.
pub fn normalize(config: &Config, source: SourceSelection) -> Result<Normalization> {
    let mut result = Normalization::default();

    if source != SourceSelection::Codeforces {
        match normalize_leetcode(config)? {
            Some((batch, document)) => {
                result.leetcode = Some(batch);
                result.leetcode_document = Some(document);
            }
            None => result.warnings.push(format!(
                "LeetCode data not found at {}",
                config.paths.leetcode_input.display()
            )),
        }
    }
    if source != SourceSelection::Leetcode {
        match normalize_codeforces(config)? {
            Some(batch) => result.codeforces = Some(batch),
            None => result.warnings.push(format!(
                "Codeforces data not found at {}",
                config.paths.codeforces_dir.display()
            )),
        }
    }

    if let Some(batch) = &result.leetcode {
        result.problems.extend(batch.problems.iter().cloned());
    }
    if let Some(batch) = &result.codeforces {
        result.problems.extend(batch.problems.iter().cloned());
        result.contests.extend(batch.contests.iter().cloned());
    }
    let names: BTreeSet<&String> = result.problems.iter().flat_map(|p| &p.topics).collect();
    result.topics = build_topic_documents(names);
    Ok(result)
}

/// Write `{output_dir}/content/leetcode/{slug}/` for every raw record with
/// a usable slug. Returns the number of problems written.
pub fn export_leetcode_content(document: &Value, output_dir: &Path) -> Result<usize> {
    let root = output_dir.join("content").join("leetcode");
    let mut written = 0;
    for raw in leetcode_records(document).unwrap_or(&[]) {
        let Some(slug) = record_slug(raw) else {
            continue;
        };
        if !is_slug(&slug) {
            warn!(%slug, "skipping content export for unsafe slug");
            continue;
        }
        let content = extract_content(raw);
        let dir = root.join(&slug);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        fs::write(dir.join("description.md"), &content.description)
            .with_context(|| format!("Failed to write description for {}", slug))?;
        save_json(&content.examples, &dir.join("examples.json"))?;
        save_json(&content.constraints, &dir.join("constraints.json"))?;
        written += 1;
    }
    Ok(written)
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!("  errors: {}", errors.len());
    for err in errors.iter().take(10) {
        println!("    - {}", err);
    }
    if errors.len() > 10 {
        println!("    ... and {} more", errors.len() - 10);
    }
}

fn print_stats(label: &str, stats: &TransformStats) {
    println!(
        "  {}: total {}, success {}, failed {}, warnings {}",
        label, stats.total, stats.success, stats.failed, stats.warnings
    );
}

/// `ph normalize`.
pub fn run_normalize(
    config: &Config,
    source: SourceSelection,
    dry_run: bool,
    with_content: bool,
) -> Result<Normalization> {
    let result = normalize(config, source)?;
    let out = &config.paths.output_dir;

    if dry_run {
        println!("normalize {} (dry-run)", source.as_str());
    } else {
        println!("normalize {}", source.as_str());
    }
    for warning in &result.warnings {
        println!("  skipped: {}", warning);
    }
    if let Some(batch) = &result.leetcode {
        print_stats("leetcode problems", &batch.stats);
        print_errors(&batch.errors);
    }
    if let Some(batch) = &result.codeforces {
        print_stats("codeforces problems", &batch.problem_stats);
        print_stats("codeforces contests", &batch.contest_stats);
        print_errors(&batch.errors);
    }
    println!("  problems: {}", result.problems.len());
    println!("  contests: {}", result.contests.len());
    println!("  topics: {}", result.topics.len());

    if dry_run {
        println!("ok");
        return Ok(result);
    }

    match source {
        SourceSelection::Leetcode => {
            if let Some(batch) = &result.leetcode {
                save_json(&batch.problems, &out.join("leetcode_problems.json"))?;
                save_json(&batch.topics, &out.join("leetcode_topics.json"))?;
            }
        }
        SourceSelection::Codeforces => {
            if let Some(batch) = &result.codeforces {
                save_json(&batch.problems, &out.join("codeforces_problems.json"))?;
                save_json(&batch.contests, &out.join("codeforces_contests.json"))?;
                save_json(&batch.topics, &out.join("codeforces_topics.json"))?;
            }
        }
        SourceSelection::All => {
            save_json(&result.problems, &out.join("problems.json"))?;
            save_json(&result.contests, &out.join("contests.json"))?;
            save_json(&result.topics, &out.join("topics.json"))?;

            let empty: &[String] = &[];
            let report = NormalizationReport {
                timestamp: Local::now().to_rfc3339(),
                stats: result.stats(),
                errors: PerSource {
                    leetcode: result.leetcode.as_ref().map_or(empty, |b| b.errors.as_slice()),
                    codeforces: result.codeforces.as_ref().map_or(empty, |b| b.errors.as_slice()),
                },
                warnings: PerSource {
                    leetcode: result.leetcode.as_ref().map_or(empty, |b| b.warnings.as_slice()),
                    codeforces: result.codeforces.as_ref().map_or(empty, |b| b.warnings.as_slice()),
                },
            };
            save_json(&report, &out.join("normalization_report.json"))?;
        }
    }
    println!("  output: {}", out.display());

    if with_content && source != SourceSelection::Codeforces {
        if let Some(document) = &result.leetcode_document {
            let written = export_leetcode_content(document, out)?;
            println!("  content exported: {}", written);
        }
    }

    println!("ok");
    Ok(result)
}
