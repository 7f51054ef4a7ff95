//! Raw input discovery.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;

/// Codeforces contest files in `dir`: `{contestId}.json` with a purely
/// numeric stem, ordered by contest id. Subdirectories are not searched.
pub fn codeforces_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<(u64, PathBuf)> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Ok(id) = stem.parse::<u64>() {
            files.push((id, path.to_path_buf()));
        }
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

pub fn list_sources(config: &Config) -> Result<()> {
    let leetcode = &config.paths.leetcode_input;
    let leetcode_status = if leetcode.is_file() {
        ("OK".to_string(), true)
    } else {
        ("MISSING".to_string(), false)
    };

    let codeforces = &config.paths.codeforces_dir;
    let codeforces_status = if codeforces.is_dir() {
        let count = codeforces_files(codeforces)?.len();
        (format!("OK ({} contests)", count), count > 0)
    } else {
        ("MISSING".to_string(), false)
    };

    println!("{:<12} {:<18} {:<10} PATH", "SOURCE", "STATUS", "AVAILABLE");
    println!(
        "{:<12} {:<18} {:<10} {}",
        "leetcode",
        leetcode_status.0,
        leetcode_status.1,
        leetcode.display()
    );
    println!(
        "{:<12} {:<18} {:<10} {}",
        "codeforces",
        codeforces_status.0,
        codeforces_status.1,
        codeforces.display()
    );

    Ok(())
}
