//! Cryptographic primitives for chromedump.
//!
//! This module provides:
//! - AES-GCM envelope decryption for encrypted cell values (`envelope`)

pub mod envelope;

pub use envelope::{decrypt_envelope, EnvelopeError};
