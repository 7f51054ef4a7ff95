//! # Problem Harness CLI (`ph`)
//!
//! The `ph` binary drives the problem metadata pipeline: normalizing raw
//! LeetCode and Codeforces dumps into canonical collections, validating
//! them, and publishing checksummed snapshots.
//!
//! ## Usage
//!
//! ```bash
//! ph --config ./config/ph.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ph sources` | Show raw input sources and whether they are available |
//! | `ph normalize` | Transform raw inputs into canonical JSON |
//! | `ph validate` | Validate canonical JSON against a schema version |
//! | `ph snapshot create` | Publish the canonical output as a versioned snapshot |
//! | `ph snapshot list` | List snapshots, oldest first |
//! | `ph snapshot verify <v>` | Re-check a snapshot's checksums |
//! | `ph snapshot next` | Print the next version for a bump |
//! | `ph gate` | Run the pre-upload checks on a snapshot |
//! | `ph pipeline` | Normalize, validate and snapshot in one run |
//! | `ph stats` | Summarize canonical output and snapshots |
//!
//! ## Examples
//!
//! ```bash
//! # Normalize only Codeforces, without writing anything
//! ph normalize --source codeforces --dry-run
//!
//! # Validate strictly and keep a rejection report on failure
//! ph validate --strict --save-report
//!
//! # Minor-version snapshot with a note
//! ph snapshot create --bump minor --notes "weekly refresh"
//!
//! # Full run; exits non-zero when any stage fails
//! ph pipeline
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use problem_harness::config::{self, Config};
use problem_harness::gate;
use problem_harness::normalize::{self, SourceSelection};
use problem_harness::pipeline::{self, PipelineOptions, StepSelection};
use problem_harness::snapshot::{Bump, SnapshotManager};
use problem_harness::sources;
use problem_harness::stats;
use problem_harness::validation::{self, ValidateOptions};

/// Problem Harness CLI: normalize, validate and snapshot competitive
/// programming problem metadata.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ph.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ph",
    about = "Problem Harness: normalize, validate and snapshot problem metadata",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ph.toml`. Relative paths inside the file are
    /// resolved against the file's directory.
    #[arg(long, global = true, default_value = "./config/ph.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List raw input sources and their availability.
    Sources,

    /// Transform raw inputs into canonical problems, contests and topics.
    ///
    /// `--source all` writes `problems.json`, `contests.json`, `topics.json`
    /// and `normalization_report.json` to the output directory. A single
    /// source writes per-source files instead.
    Normalize {
        /// Which source to normalize.
        #[arg(long, value_enum, default_value = "all")]
        source: SourceSelection,

        /// Compute everything but write nothing.
        #[arg(long)]
        dry_run: bool,

        /// Also export extracted LeetCode content under `content/leetcode/`.
        #[arg(long)]
        with_content: bool,
    },

    /// Validate canonical output.
    ///
    /// Exits non-zero when the data is invalid.
    Validate {
        /// Directory holding the canonical files (defaults to the output dir).
        #[arg(long)]
        input: Option<PathBuf>,

        /// Schema version to validate against (defaults to the config value).
        #[arg(long)]
        schema_version: Option<String>,

        /// Treat warnings as errors.
        #[arg(long)]
        strict: bool,

        /// Write a rejection report when validation fails.
        #[arg(long)]
        save_report: bool,
    },

    /// Manage versioned snapshots.
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Run the pre-upload checks against a snapshot.
    ///
    /// Exits non-zero when any check fails.
    Gate {
        /// Snapshot version (defaults to the latest).
        #[arg(long)]
        version: Option<String>,
    },

    /// Run normalize, validate and snapshot in sequence.
    ///
    /// Each stage only runs when the previous one succeeded. Exits non-zero
    /// when any stage fails.
    Pipeline {
        /// Run only one stage.
        #[arg(long, value_enum, default_value = "all")]
        step: StepSelection,

        /// Normalize without writing and skip the snapshot.
        #[arg(long)]
        dry_run: bool,

        /// Schema version for the validation stage.
        #[arg(long)]
        schema_version: Option<String>,

        /// Snapshot version (defaults to the next version for the
        /// configured bump).
        #[arg(long)]
        snapshot_version: Option<String>,

        /// Free-form note stored in the snapshot manifest.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Summarize canonical output and snapshots.
    Stats,
}

/// Snapshot subcommands.
#[derive(Subcommand)]
enum SnapshotAction {
    /// Copy the canonical output into a new versioned snapshot.
    Create {
        /// Explicit version (`vX.Y.Z`).
        #[arg(long, conflicts_with = "bump")]
        version: Option<String>,

        /// Bump applied to the latest version when `--version` is absent.
        #[arg(long, value_enum)]
        bump: Option<Bump>,

        /// Directory holding the canonical files (defaults to the output dir).
        #[arg(long)]
        source: Option<PathBuf>,

        /// Free-form note stored in the manifest.
        #[arg(long)]
        notes: Option<String>,

        /// Replace an existing snapshot of the same version.
        #[arg(long)]
        force: bool,
    },

    /// List snapshots, oldest first.
    List,

    /// Re-compute a snapshot's checksums and compare with its manifest.
    Verify {
        /// Snapshot version (`vX.Y.Z`).
        version: String,
    },

    /// Print the version the next snapshot would get.
    Next {
        #[arg(long, value_enum)]
        bump: Option<Bump>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let passed = match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg)?;
            true
        }
        Commands::Normalize {
            source,
            dry_run,
            with_content,
        } => {
            normalize::run_normalize(&cfg, source, dry_run, with_content)?;
            true
        }
        Commands::Validate {
            input,
            schema_version,
            strict,
            save_report,
        } => {
            let opts = ValidateOptions {
                input_dir: input,
                schema_version,
                strict,
                save_report,
            };
            validation::run_validate(&cfg, &opts)?.is_valid
        }
        Commands::Snapshot { action } => run_snapshot(&cfg, action)?,
        Commands::Gate { version } => {
            let manager = SnapshotManager::new(&cfg.paths.validated_dir);
            gate::run_gate(&manager, version.as_deref())?.all_passed
        }
        Commands::Pipeline {
            step,
            dry_run,
            schema_version,
            snapshot_version,
            notes,
        } => {
            let opts = PipelineOptions {
                steps: step,
                dry_run,
                schema_version,
                snapshot_version,
                notes,
            };
            pipeline::run_pipeline(&cfg, &opts)?.success()
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
            true
        }
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_snapshot(cfg: &Config, action: SnapshotAction) -> Result<bool> {
    let manager = SnapshotManager::new(&cfg.paths.validated_dir);

    match action {
        SnapshotAction::Create {
            version,
            bump,
            source,
            notes,
            force,
        } => {
            let version = match version {
                Some(v) => v,
                None => manager
                    .next_version(bump.unwrap_or(cfg.snapshot.default_bump))?
                    .to_string(),
            };
            let source = source.unwrap_or_else(|| cfg.paths.output_dir.clone());
            let manifest = manager.create(
                &version,
                &source,
                &cfg.validation.schema_version,
                notes.as_deref(),
                force,
            )?;

            println!("snapshot {}", manifest.version);
            println!("  path: {}", manager.path_for(&manifest.version)?.display());
            println!("  schema version: {}", manifest.schema_version);
            println!("  problems: {}", manifest.counts.problems);
            println!("  topics: {}", manifest.counts.topics);
            if let Some(contests) = manifest.counts.contests {
                println!("  contests: {}", contests);
            }
            println!("ok");
            Ok(true)
        }
        SnapshotAction::List => {
            let snapshots = manager.list()?;
            if snapshots.is_empty() {
                println!("No snapshots in {}", manager.root().display());
                return Ok(true);
            }
            println!(
                "{:<12} {:<30} {:>8} {:>8}   SCHEMA",
                "VERSION", "CREATED", "PROBLEMS", "TOPICS"
            );
            for snap in snapshots {
                match snap.manifest {
                    Some(m) => println!(
                        "{:<12} {:<30} {:>8} {:>8}   {}",
                        snap.version, m.created_at, m.counts.problems, m.counts.topics, m.schema_version
                    ),
                    None => println!("{:<12} (no manifest)", snap.version),
                }
            }
            Ok(true)
        }
        SnapshotAction::Verify { version } => {
            let verification = manager.verify(&version)?;
            println!("verify {}", verification.version);
            if let Some(manifest) = &verification.manifest {
                println!("  files checked: {}", manifest.file_checksums().count());
            }
            for err in &verification.errors {
                println!("  error: {}", err);
            }
            println!("{}", if verification.valid { "ok" } else { "invalid" });
            Ok(verification.valid)
        }
        SnapshotAction::Next { bump } => {
            let next = manager.next_version(bump.unwrap_or(cfg.snapshot.default_bump))?;
            println!("{}", next);
            Ok(true)
        }
    }
}
