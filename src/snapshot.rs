//! Immutable, versioned snapshots of the canonical collections.
//!
//! A snapshot is a directory `{validated_dir}/vX.Y.Z/` holding byte-exact
//! copies of `problems.json`, `topics.json` and (when present)
//! `contests.json`, plus:
//!
//! - `manifest.json`: version, schema version, UTC creation time, counts,
//!   a canonical content checksum per collection (`<file>`) and a raw file
//!   checksum per copied file (`<file>_file`).
//! - `checksum.txt`: `sha256sum`-compatible listing of every JSON file in
//!   the directory.
//!
//! Creation runs every pre-flight check (version format, existing version,
//! source files present and parseable) before touching the snapshot root,
//! so a failed create leaves the existing snapshot set unchanged.

use chrono::Utc;
use problem_harness_core::checksum::{self, PREFIX};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHECKSUM_FILE: &str = "checksum.txt";

const PROBLEMS_FILE: &str = "problems.json";
const TOPICS_FILE: &str = "topics.json";
const CONTESTS_FILE: &str = "contests.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid version format: {0} (expected vX.Y.Z)")]
    InvalidVersion(String),

    #[error("Version {0} already exists. Use --force to overwrite.")]
    AlreadyExists(String),

    #[error("Source data not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("Invalid JSON in source data {}: {reason}", path.display())]
    MalformedSource { path: PathBuf, reason: String },

    #[error("Version {0} does not exist")]
    NotFound(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Semantic version of a snapshot directory, written `vX.Y.Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const INITIAL: Version = Version {
        major: 1,
        minor: 0,
        patch: 0,
    };

    pub fn bump(self, bump: Bump) -> Version {
        match bump {
            Bump::Major => Version {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            Bump::Minor => Version {
                minor: self.minor + 1,
                patch: 0,
                ..self
            },
            Bump::Patch => Version {
                patch: self.patch + 1,
                ..self
            },
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SnapshotError::InvalidVersion(s.to_string());
        let digits = s.strip_prefix('v').ok_or_else(invalid)?;
        let parts: Vec<&str> = digits.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(invalid());
        };
        let number = |p: &str| -> Result<u64, SnapshotError> {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            p.parse().map_err(|_| invalid())
        };
        Ok(Version {
            major: number(*major)?,
            minor: number(*minor)?,
            patch: number(*patch)?,
        })
    }
}

/// Which version component to increment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    Major,
    Minor,
    #[default]
    Patch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCounts {
    pub problems: usize,
    pub topics: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contests: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub created_at: String,
    pub schema_version: String,
    pub counts: ManifestCounts,
    /// `<file>` → canonical content checksum, `<file>_file` → raw file
    /// checksum. Both `sha256:<hex>`.
    pub checksums: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Manifest {
    /// Files covered by a raw file checksum, with the expected value.
    pub fn file_checksums(&self) -> impl Iterator<Item = (&str, &str)> {
        self.checksums.iter().filter_map(|(key, value)| {
            key.strip_suffix("_file")
                .map(|file| (file, value.as_str()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumMismatch {
    pub file: String,
    pub expected: String,
    pub actual: String,
}

/// Result of [`SnapshotManager::verify`].
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub version: String,
    pub path: PathBuf,
    pub valid: bool,
    pub manifest: Option<Manifest>,
    pub missing: Vec<String>,
    pub mismatches: Vec<ChecksumMismatch>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub version: String,
    pub path: PathBuf,
    pub manifest: Option<Manifest>,
}

/// A source collection that passed pre-flight: the exact bytes and the
/// parsed array.
struct Collection {
    file: &'static str,
    bytes: Vec<u8>,
    records: Value,
}

impl Collection {
    fn len(&self) -> usize {
        self.records.as_array().map_or(0, Vec::len)
    }
}

fn load_collection(dir: &Path, file: &'static str) -> Result<Option<Collection>, SnapshotError> {
    let path = dir.join(file);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(&path)(e)),
    };
    let records: Value =
        serde_json::from_slice(&bytes).map_err(|e| SnapshotError::MalformedSource {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    if !records.is_array() {
        return Err(SnapshotError::MalformedSource {
            path,
            reason: "expected a JSON array".to_string(),
        });
    }
    Ok(Some(Collection {
        file,
        bytes,
        records,
    }))
}

fn require_collection(dir: &Path, file: &'static str) -> Result<Collection, SnapshotError> {
    load_collection(dir, file)?.ok_or_else(|| SnapshotError::MissingSource(dir.join(file)))
}

/// `sha256:<hex>` of a file's bytes, read in fixed-size blocks.
pub fn file_checksum(path: &Path) -> Result<String, SnapshotError> {
    let mut file = File::open(path).map_err(io_err(path))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(io_err(path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{}{}", PREFIX, hex::encode(hasher.finalize())))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let file = File::create(path).map_err(io_err(path))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).map_err(io_err(path))?;
    writer.flush().map_err(io_err(path))?;
    Ok(())
}

/// Manages the snapshot root directory.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    root: PathBuf,
}

impl SnapshotManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of snapshot `version`. Anything other than `vX.Y.Z` is
    /// rejected, so the result is always a direct child of the root.
    pub fn path_for(&self, version: &str) -> Result<PathBuf, SnapshotError> {
        Ok(self.dir_of(&version.parse()?))
    }

    fn dir_of(&self, version: &Version) -> PathBuf {
        self.root.join(version.to_string())
    }

    /// Existing snapshot versions in ascending order. Directories whose
    /// names are not `vX.Y.Z` are ignored.
    pub fn versions(&self) -> Result<Vec<Version>, SnapshotError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.root)(e)),
        };
        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_err(&self.root))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(version) = entry.file_name().to_str().and_then(|n| n.parse::<Version>().ok()) {
                versions.push(version);
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// The version after the highest existing one, or `v1.0.0` when there
    /// are no snapshots.
    pub fn next_version(&self, bump: Bump) -> Result<Version, SnapshotError> {
        Ok(match self.versions()?.last() {
            Some(latest) => latest.bump(bump),
            None => Version::INITIAL,
        })
    }

    pub fn load_manifest(&self, version: &str) -> Result<Manifest, SnapshotError> {
        let path = self.path_for(version)?.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path).map_err(io_err(&path))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn list(&self) -> Result<Vec<SnapshotInfo>, SnapshotError> {
        self.versions()?
            .into_iter()
            .map(|version| {
                let path = self.dir_of(&version);
                let version = version.to_string();
                let manifest = if path.join(MANIFEST_FILE).is_file() {
                    match self.load_manifest(&version) {
                        Ok(manifest) => Some(manifest),
                        Err(e) => {
                            warn!(%version, error = %e, "unreadable snapshot manifest");
                            None
                        }
                    }
                } else {
                    None
                };
                Ok(SnapshotInfo {
                    version,
                    path,
                    manifest,
                })
            })
            .collect()
    }

    pub fn latest(&self) -> Result<Option<SnapshotInfo>, SnapshotError> {
        Ok(self.list()?.pop())
    }

    /// Create snapshot `version` from the canonical files in `source_dir`.
    ///
    /// With `force`, an existing snapshot of the same version is removed
    /// first; its files are never merged with the new ones.
    pub fn create(
        &self,
        version: &str,
        source_dir: &Path,
        schema_version: &str,
        notes: Option<&str>,
        force: bool,
    ) -> Result<Manifest, SnapshotError> {
        let parsed = version.parse::<Version>()?;
        let snapshot_dir = self.dir_of(&parsed);
        let version = parsed.to_string();
        let exists = snapshot_dir.exists();
        if exists && !force {
            return Err(SnapshotError::AlreadyExists(version));
        }

        let mut collections = vec![
            require_collection(source_dir, PROBLEMS_FILE)?,
            require_collection(source_dir, TOPICS_FILE)?,
        ];
        let has_contests = match load_collection(source_dir, CONTESTS_FILE)? {
            Some(contests) => {
                collections.push(contests);
                true
            }
            None => false,
        };

        if exists {
            warn!(%version, "overwriting existing snapshot");
            fs::remove_dir_all(&snapshot_dir).map_err(io_err(&snapshot_dir))?;
        }
        fs::create_dir_all(&snapshot_dir).map_err(io_err(&snapshot_dir))?;

        let mut checksums = BTreeMap::new();
        for collection in &collections {
            let dest = snapshot_dir.join(collection.file);
            write_file(&dest, &collection.bytes)?;
            checksums.insert(
                collection.file.to_string(),
                checksum::content_checksum(&collection.records),
            );
            checksums.insert(format!("{}_file", collection.file), file_checksum(&dest)?);
            debug!(file = collection.file, records = collection.len(), "copied collection");
        }

        let manifest = Manifest {
            version: version.clone(),
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            schema_version: schema_version.to_string(),
            counts: ManifestCounts {
                problems: collections[0].len(),
                topics: collections[1].len(),
                contests: has_contests.then(|| collections[2].len()),
            },
            checksums,
            notes: notes.filter(|n| !n.is_empty()).map(str::to_string),
        };

        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        write_file(&snapshot_dir.join(MANIFEST_FILE), manifest_json.as_bytes())?;
        write_checksum_file(&snapshot_dir)?;

        info!(
            %version,
            problems = manifest.counts.problems,
            topics = manifest.counts.topics,
            "snapshot created"
        );
        Ok(manifest)
    }

    /// Recompute every recorded file checksum and compare with the
    /// manifest. A missing snapshot or manifest is reported as an error in
    /// the result, not as `Err`; a malformed version is an `Err`.
    pub fn verify(&self, version: &str) -> Result<Verification, SnapshotError> {
        let path = self.path_for(version)?;
        let mut verification = Verification {
            version: version.to_string(),
            path: path.clone(),
            valid: false,
            manifest: None,
            missing: Vec::new(),
            mismatches: Vec::new(),
            errors: Vec::new(),
        };

        if !path.is_dir() {
            verification
                .errors
                .push(SnapshotError::NotFound(version.to_string()).to_string());
            return Ok(verification);
        }
        if !path.join(MANIFEST_FILE).is_file() {
            verification.errors.push("Manifest file not found".to_string());
            return Ok(verification);
        }
        let manifest = match self.load_manifest(version) {
            Ok(manifest) => manifest,
            Err(e) => {
                verification
                    .errors
                    .push(format!("Failed to load manifest: {}", e));
                return Ok(verification);
            }
        };

        for (file, expected) in manifest.file_checksums() {
            let file_path = path.join(file);
            if !file_path.is_file() {
                verification.missing.push(file.to_string());
                continue;
            }
            let actual = file_checksum(&file_path)?;
            if actual != expected {
                verification.mismatches.push(ChecksumMismatch {
                    file: file.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if !verification.missing.is_empty() {
            verification
                .errors
                .push(format!("Missing files: {}", verification.missing.join(", ")));
        }
        for m in &verification.mismatches {
            verification.errors.push(format!(
                "Checksum mismatch for {}: expected {}, got {}",
                m.file, m.expected, m.actual
            ));
        }

        verification.valid = verification.errors.is_empty();
        verification.manifest = Some(manifest);
        Ok(verification)
    }
}

/// Write `checksum.txt` covering every `*.json` file in `dir`, sorted by
/// file name: `<hex>  <name>` per line.
fn write_checksum_file(dir: &Path) -> Result<(), SnapshotError> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(io_err(dir))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(".json"))
        .collect();
    names.sort();

    let mut out = String::new();
    for name in &names {
        let sum = file_checksum(&dir.join(name))?;
        let hex = sum.strip_prefix(PREFIX).unwrap_or(&sum);
        out.push_str(&format!("{}  {}\n", hex, name));
    }
    write_file(&dir.join(CHECKSUM_FILE), out.as_bytes())
}
