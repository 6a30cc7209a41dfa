//! Best-effort rendering of arbitrary bytes as a JSON-safe string.
//!
//! Used as the decryptor's fallback and for any binary payload the
//! cipher does not apply to. Total over all byte sequences: every
//! input becomes a string, nothing panics, nothing errors.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Decode bytes as UTF-8, dropping invalid sequences.
pub fn utf8_ignoring_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(tail) => {
                out.push_str(tail);
                break;
            }
            Err(err) => {
                let valid = err.valid_up_to();
                if valid > 0 {
                    // The prefix up to `valid` is guaranteed UTF-8.
                    out.push_str(&String::from_utf8_lossy(&rest[..valid]));
                }
                let skip = err.error_len().unwrap_or(rest.len() - valid);
                rest = &rest[valid + skip..];
            }
        }
    }

    out
}

/// Render arbitrary bytes as a JSON-safe string.
///
/// UTF-8 with invalid sequences dropped when any text survives;
/// base64 when nothing decodable remains.
pub fn best_effort_decode(bytes: &[u8]) -> String {
    let text = utf8_ignoring_invalid(bytes);
    if text.is_empty() && !bytes.is_empty() {
        return BASE64.encode(bytes);
    }
    text
}
