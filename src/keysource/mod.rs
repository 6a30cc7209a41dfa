//! Master key retrieval from OS-protected secret stores.
//!
//! Chromium keeps the key that protects cookie and login values in a
//! per-user OS facility: a DPAPI envelope inside `Local State` on
//! Windows, a "Safe Storage" keychain entry everywhere else. Each
//! mechanism is a [`KeySource`]; one is selected at startup via
//! [`platform_source`].
//!
//! Key retrieval failure is never fatal — the exporter reports it and
//! continues with pass-through decoding of encrypted cells.

#[cfg(not(windows))]
pub mod keychain;
pub mod local_state;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use crate::errors::{ChromeDumpError, Result};

/// Raw symmetric key recovered from the OS secret store.
///
/// Wiped from memory on drop. Valid AES-GCM widths are 16, 24, and
/// 32 bytes; the envelope decryptor picks the cipher accordingly.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: Vec<u8>,
}

impl MasterKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A place we can ask for the browser master key.
///
/// One implementation per platform family, selected once at startup
/// rather than branched on throughout the pipeline.
pub trait KeySource {
    /// Human-readable description for events and the `key` command.
    fn describe(&self) -> String;

    /// Retrieve the raw key bytes.
    fn fetch(&self) -> Result<MasterKey>;
}

/// Chromium-family browsers with known secret-store coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Chromium,
    Edge,
    Brave,
    Vivaldi,
}

impl Browser {
    /// Parse a browser name as given on the command line or in config.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "chrome" | "google chrome" => Ok(Self::Chrome),
            "chromium" => Ok(Self::Chromium),
            "edge" | "microsoft edge" => Ok(Self::Edge),
            "brave" => Ok(Self::Brave),
            "vivaldi" => Ok(Self::Vivaldi),
            other => Err(ChromeDumpError::CommandFailed(format!(
                "unknown browser '{other}' — supported: chrome, chromium, edge, brave, vivaldi"
            ))),
        }
    }

    /// Keychain service name (macOS Keychain / Linux Secret Service).
    pub fn keychain_service(&self) -> &'static str {
        match self {
            Self::Chrome => "Chrome Safe Storage",
            Self::Chromium => "Chromium Safe Storage",
            Self::Edge => "Microsoft Edge Safe Storage",
            Self::Brave => "Brave Safe Storage",
            Self::Vivaldi => "Vivaldi Safe Storage",
        }
    }

    /// Account name stored alongside the service entry.
    pub fn keychain_account(&self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Chromium => "Chromium",
            Self::Edge => "Microsoft Edge",
            Self::Brave => "Brave",
            Self::Vivaldi => "Vivaldi",
        }
    }

    /// Path fragment under `%LOCALAPPDATA%` holding the `User Data`
    /// directory on Windows.
    pub fn user_data_fragment(&self) -> &'static [&'static str] {
        match self {
            Self::Chrome => &["Google", "Chrome", "User Data"],
            Self::Chromium => &["Chromium", "User Data"],
            Self::Edge => &["Microsoft", "Edge", "User Data"],
            Self::Brave => &["BraveSoftware", "Brave-Browser", "User Data"],
            Self::Vivaldi => &["Vivaldi", "User Data"],
        }
    }
}

/// Caller-supplied key, decoded from base64 (`--master-key`).
///
/// Lets a dump run against a database copied from another machine, and
/// gives tests a deterministic key without touching any secret store.
pub struct StaticKeySource {
    encoded: String,
}

impl StaticKeySource {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
        }
    }
}

impl KeySource for StaticKeySource {
    fn describe(&self) -> String {
        "explicit --master-key argument".to_string()
    }

    fn fetch(&self) -> Result<MasterKey> {
        let bytes = BASE64.decode(self.encoded.trim()).map_err(|e| {
            ChromeDumpError::KeySource(format!("master key is not valid base64: {e}"))
        })?;

        match bytes.len() {
            16 | 24 | 32 => Ok(MasterKey::new(bytes)),
            n => Err(ChromeDumpError::KeySource(format!(
                "master key must be 16, 24, or 32 bytes, got {n}"
            ))),
        }
    }
}

/// Pick the key source for this platform and browser.
#[cfg(windows)]
pub fn platform_source(browser: Browser) -> Box<dyn KeySource> {
    Box::new(local_state::LocalStateKeySource::for_browser(browser))
}

/// Pick the key source for this platform and browser.
#[cfg(not(windows))]
pub fn platform_source(browser: Browser) -> Box<dyn KeySource> {
    Box::new(keychain::KeychainKeySource::for_browser(browser))
}
