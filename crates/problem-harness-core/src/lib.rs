//! # Problem Harness Core
//!
//! Pure logic for Problem Harness: canonical models, deterministic
//! identity, topic and content normalization, per-platform transformers,
//! the validation engine and canonical checksums.
//!
//! This crate performs no filesystem I/O and holds no process-global
//! mutable state. Everything that reads or writes files lives in the
//! `problem-harness` crate.

pub mod checksum;
pub mod content;
pub mod identity;
pub mod models;
pub mod topics;
pub mod transform;
pub mod validate;
