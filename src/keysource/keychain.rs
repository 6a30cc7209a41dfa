//! OS keychain key source (macOS Keychain, Linux Secret Service).
//!
//! Outside Windows, Chromium keeps a "Safe Storage" password under a
//! well-known service/account pair. The password's UTF-8 bytes are
//! used directly as the cell decryption key.

use keyring::Entry;

use super::{Browser, KeySource, MasterKey};
use crate::errors::{ChromeDumpError, Result};

/// Key source backed by a named keychain entry.
pub struct KeychainKeySource {
    service: String,
    account: String,
}

impl KeychainKeySource {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    /// Use the well-known service/account pair for `browser`.
    pub fn for_browser(browser: Browser) -> Self {
        Self::new(browser.keychain_service(), browser.keychain_account())
    }
}

impl KeySource for KeychainKeySource {
    fn describe(&self) -> String {
        format!("OS keychain entry '{}' ({})", self.service, self.account)
    }

    fn fetch(&self) -> Result<MasterKey> {
        let entry = Entry::new(&self.service, &self.account).map_err(|e| {
            ChromeDumpError::KeySource(format!("failed to open keychain entry: {e}"))
        })?;

        match entry.get_password() {
            Ok(password) => Ok(MasterKey::new(password.into_bytes())),
            Err(keyring::Error::NoEntry) => Err(ChromeDumpError::KeySource(format!(
                "no keychain entry for '{}'",
                self.service
            ))),
            Err(e) => Err(ChromeDumpError::KeySource(format!(
                "keychain lookup failed: {e}"
            ))),
        }
    }
}
