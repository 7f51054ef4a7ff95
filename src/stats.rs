//! Canonical output and snapshot overview.
//!
//! Summarizes what the last normalization produced (problems by source and
//! difficulty, topics by category, contests) and which snapshots exist.
//! Used by `ph stats` as a quick sanity check between pipeline runs.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::snapshot::SnapshotManager;
use crate::validation::load_collections;

/// Count records by the string value of `field`. Missing values count as
/// `unknown`.
pub fn count_by(records: &[Value], field: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let key = record
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

fn format_counts(counts: &BTreeMap<String, usize>) -> String {
    if counts.is_empty() {
        return "-".to_string();
    }
    counts
        .iter()
        .map(|(k, v)| format!("{} {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Total size of every file under `dir`.
fn dir_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// `ph stats`.
pub fn run_stats(config: &Config) -> Result<()> {
    let collections = load_collections(&config.paths.output_dir)?;

    println!("Problem Harness Stats");
    println!("=====================");
    println!();
    println!("  Output:      {}", config.paths.output_dir.display());
    println!("  Problems:    {}", collections.problems.len());
    println!("    by source:     {}", format_counts(&count_by(&collections.problems, "source")));
    println!(
        "    by difficulty: {}",
        format_counts(&count_by(&collections.problems, "difficulty"))
    );
    println!("  Topics:      {}", collections.topics.len());
    println!("    by category:   {}", format_counts(&count_by(&collections.topics, "category")));
    println!("  Contests:    {}", collections.contests.len());

    let manager = SnapshotManager::new(&config.paths.validated_dir);
    let snapshots = manager.list()?;
    let now = Utc::now();
    println!();
    if snapshots.is_empty() {
        println!("  Snapshots:   none");
        println!();
        return Ok(());
    }

    println!("  Snapshots:");
    println!(
        "  {:<12} {:>8} {:>8} {:>8} {:>10}   {}",
        "VERSION", "PROBLEMS", "TOPICS", "CONTESTS", "SIZE", "CREATED"
    );
    println!("  {}", "-".repeat(72));
    for snap in &snapshots {
        let (problems, topics, contests, created) = match &snap.manifest {
            Some(m) => (
                m.counts.problems.to_string(),
                m.counts.topics.to_string(),
                m.counts.contests.map_or("-".to_string(), |c| c.to_string()),
                created_column(&m.created_at, now),
            ),
            None => ("?".into(), "?".into(), "?".into(), "no manifest".into()),
        };
        println!(
            "  {:<12} {:>8} {:>8} {:>8} {:>10}   {}",
            snap.version,
            problems,
            topics,
            contests,
            snapshot_size(dir_size(&snap.path)),
            created
        );
    }
    println!();
    Ok(())
}

const SIZE_UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Snapshot size for the listing, in binary units.
pub fn snapshot_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, SIZE_UNITS[0])
    } else {
        format!("{:.1} {}", value, SIZE_UNITS[unit])
    }
}

/// Age of a snapshot at `now`, compact enough for a table column.
/// Snapshots older than a week, or stamped after `now`, show their date.
pub fn snapshot_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(created);
    if age < Duration::zero() || age >= Duration::weeks(1) {
        return created.format("%Y-%m-%d").to_string();
    }
    if age < Duration::minutes(1) {
        "<1m ago".to_string()
    } else if age < Duration::hours(1) {
        format!("{}m ago", age.num_minutes())
    } else if age < Duration::days(1) {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}d ago", age.num_days())
    }
}

/// Manifest `created_at` rendered as an age; unparseable stamps are shown
/// verbatim.
fn created_column(created_at: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(created) => snapshot_age(created.with_timezone(&Utc), now),
        Err(_) => created_at.to_string(),
    }
}
