//! # Problem Harness
//!
//! Turns competitive-programming problem metadata from LeetCode and
//! Codeforces into one canonical format, validates it, and publishes it as
//! immutable, checksummed snapshots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌─────────────┐   ┌────────────┐
//! │ raw JSON     │──▶│  normalize  │──▶│  validate   │──▶│  snapshot  │
//! │ LC / CF dump │   │  canonical  │   │  4 rule sets│   │ vX.Y.Z dir │
//! └──────────────┘   └─────────────┘   └──────┬──────┘   └─────┬──────┘
//!                                             │                │
//!                                             ▼                ▼
//!                                       rejected/         upload gate
//! ```
//!
//! The transformation and validation logic lives in the I/O-free
//! `problem-harness-core` crate; this crate reads and writes files and
//! drives the `ph` command line.
//!
//! ## Quick Start
//!
//! ```bash
//! ph sources                    # check raw inputs
//! ph normalize                  # write output/{problems,contests,topics}.json
//! ph validate                   # check canonical output
//! ph snapshot create            # copy to validated/v1.0.0/
//! ph gate                       # pre-upload checks on the latest snapshot
//! ph pipeline                   # all of the above in one go
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`sources`] | Raw input discovery |
//! | [`normalize`] | Normalization runner and canonical output files |
//! | [`validation`] | Validation runner and rejection reports |
//! | [`snapshot`] | Versioned snapshots, manifests, verification |
//! | [`gate`] | Pre-upload checks |
//! | [`pipeline`] | Stage orchestration |
//! | [`stats`] | Output and snapshot overview |

pub mod config;
pub mod gate;
pub mod normalize;
pub mod pipeline;
pub mod snapshot;
pub mod sources;
pub mod stats;
pub mod validation;
