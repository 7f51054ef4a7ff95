//! SHA-256 checksums for canonical collections and files.
//!
//! Two flavours are recorded in a snapshot manifest:
//!
//! - **content checksum**: hash of the collection re-serialized in canonical
//!   form (object keys sorted, `", "` / `": "` separators, non-ASCII kept
//!   literal). Stable under any reformatting of the file on disk.
//! - **file checksum**: hash of the exact bytes written.
//!
//! Both are rendered as `sha256:<hex>`.

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io;

pub const PREFIX: &str = "sha256:";

/// Single-line JSON with a space after every separator.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Canonical serialization of a JSON value. Object keys come out sorted
/// because `serde_json::Map` is ordered by key.
pub fn canonical_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    // Serializing a Value into a Vec cannot fail.
    if value.serialize(&mut ser).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

/// Hex SHA-256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `sha256:<hex>` of raw bytes.
pub fn sha256_prefixed(bytes: &[u8]) -> String {
    format!("{}{}", PREFIX, sha256_hex(bytes))
}

/// `sha256:<hex>` of the canonical serialization of `value`.
pub fn content_checksum(value: &Value) -> String {
    sha256_prefixed(canonical_json(value).as_bytes())
}
