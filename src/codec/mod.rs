//! Per-cell value classification and normalization.
//!
//! Every SQLite cell becomes a JSON-safe value (string, number, or
//! null). Dispatch is on the runtime value type; the declared column
//! type is carried through for future use but not branched on.

pub mod decode;
pub mod timestamp;

pub use decode::{best_effort_decode, utf8_ignoring_invalid};
pub use timestamp::{normalize_integer, normalize_real};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rusqlite::types::ValueRef;
use serde_json::Value;

use crate::crypto::decrypt_envelope;
use crate::keysource::MasterKey;

/// Signatures marking a blob as sync metadata.
///
/// Cells with these prefixes are deliberately never decrypted, only
/// base64-encoded. The prefixes are an upstream heuristic preserved
/// verbatim.
const SYNC_PREFIXES: [&[u8]; 2] = [b"v10", b"\nA"];

/// True if `bytes` carries a sync-metadata signature.
pub fn is_sync_metadata(bytes: &[u8]) -> bool {
    SYNC_PREFIXES.iter().any(|prefix| bytes.starts_with(prefix))
}

/// Normalize one cell into a JSON-safe value.
///
/// `declared_type` is the column's declared SQL type, accepted for
/// forward compatibility and currently unused in dispatch.
pub fn normalize(value: ValueRef<'_>, declared_type: &str, key: Option<&MasterKey>) -> Value {
    let _ = declared_type;

    match value {
        ValueRef::Blob(bytes) => normalize_blob(bytes, key),
        ValueRef::Integer(n) => normalize_integer(n),
        ValueRef::Real(f) => normalize_real(f),
        ValueRef::Text(bytes) => Value::String(utf8_ignoring_invalid(bytes)),
        ValueRef::Null => Value::Null,
    }
}

/// Classify and transform a binary cell.
///
/// Sync metadata is encoded as-is; everything else goes through the
/// decryptor when a key is available, with best-effort decode of the
/// original bytes as the answer to every failure.
fn normalize_blob(bytes: &[u8], key: Option<&MasterKey>) -> Value {
    if is_sync_metadata(bytes) {
        return Value::String(BASE64.encode(bytes));
    }

    let text = match key {
        Some(key) => {
            decrypt_envelope(key, bytes).unwrap_or_else(|_| best_effort_decode(bytes))
        }
        None => best_effort_decode(bytes),
    };

    Value::String(text)
}
