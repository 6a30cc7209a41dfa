//! AES-GCM envelope decryption.
//!
//! Chromium stores each encrypted cell as:
//!   [ 3-byte version tag | 12-byte nonce | ciphertext | 16-byte auth tag ]
//!
//! The version tag is not part of the cipher input. The AEAD consumes
//! ciphertext and tag together and verifies the tag while decrypting;
//! a tag mismatch is a decryption failure.
//!
//! Errors here never reach the user: the codec answers every failure
//! with a best-effort decode of the original envelope bytes, since
//! some cells merely resemble ciphertext.

use aes_gcm::aead::generic_array::typenum::U12;
use aes_gcm::aead::Aead;
use aes_gcm::{aes::Aes192, Aes128Gcm, Aes256Gcm, AesGcm, KeyInit, Nonce};
use thiserror::Error;

use crate::codec::decode::utf8_ignoring_invalid;
use crate::keysource::MasterKey;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Version tag bytes at the front of an envelope.
const VERSION_LEN: usize = 3;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Bytes before the ciphertext starts: version tag + nonce.
const HEADER_LEN: usize = VERSION_LEN + NONCE_LEN;

/// Why an envelope could not be opened.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("envelope too short to contain a nonce and ciphertext")]
    TooShort,

    #[error("unsupported key length {0} (expected 16, 24, or 32 bytes)")]
    BadKeyLength(usize),

    #[error("authentication failed — not a valid envelope for this key")]
    CipherFailure,
}

/// Decrypt one cell envelope with the recovered master key.
///
/// The cipher width follows the key length. A successful decrypt
/// always yields a string: the plaintext is rendered with the same
/// UTF-8 decode used by the fallback path.
pub fn decrypt_envelope(key: &MasterKey, envelope: &[u8]) -> Result<String, EnvelopeError> {
    if envelope.len() <= HEADER_LEN {
        return Err(EnvelopeError::TooShort);
    }

    let nonce = Nonce::from_slice(&envelope[VERSION_LEN..HEADER_LEN]);
    // Ciphertext and trailing tag together; the AEAD splits them.
    let ciphertext = &envelope[HEADER_LEN..];

    let plaintext = match key.len() {
        16 => Aes128Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| EnvelopeError::BadKeyLength(key.len()))?
            .decrypt(nonce, ciphertext),
        24 => Aes192Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| EnvelopeError::BadKeyLength(key.len()))?
            .decrypt(nonce, ciphertext),
        32 => Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| EnvelopeError::BadKeyLength(key.len()))?
            .decrypt(nonce, ciphertext),
        other => return Err(EnvelopeError::BadKeyLength(other)),
    }
    .map_err(|_| EnvelopeError::CipherFailure)?;

    Ok(utf8_ignoring_invalid(&plaintext))
}
