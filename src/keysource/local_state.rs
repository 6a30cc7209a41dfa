//! Windows `Local State` key source.
//!
//! Chromium on Windows stores the cell encryption key in the profile's
//! `Local State` JSON under `os_crypt.encrypted_key`: a base64 blob
//! carrying a 5-byte `DPAPI` tag followed by a per-user
//! `CryptProtectData` envelope. Unprotecting the envelope yields the
//! raw AES-GCM key.
//!
//! The JSON/base64/prefix handling is platform-independent and lives in
//! [`parse_local_state`]; only the final DPAPI call needs Windows.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::{Browser, KeySource, MasterKey};
use crate::errors::{ChromeDumpError, Result};

/// Tag Chromium puts in front of the DPAPI envelope.
const DPAPI_PREFIX: &[u8] = b"DPAPI";

/// Key source backed by a browser profile's `Local State` file.
pub struct LocalStateKeySource {
    local_state: PathBuf,
}

impl LocalStateKeySource {
    /// Point at an explicit `Local State` file.
    pub fn new(local_state: PathBuf) -> Self {
        Self { local_state }
    }

    /// Resolve the default `Local State` location for `browser` under
    /// `%LOCALAPPDATA%`.
    pub fn for_browser(browser: Browser) -> Self {
        let mut path = std::env::var_os("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_default();
        for part in browser.user_data_fragment() {
            path.push(part);
        }
        path.push("Local State");
        Self::new(path)
    }
}

/// Extract the protected key blob from `Local State` JSON text.
///
/// Returns the DPAPI envelope with the 5-byte tag already stripped.
pub fn parse_local_state(raw: &str) -> Result<Vec<u8>> {
    let parsed: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
        ChromeDumpError::KeySource(format!("Local State is not valid JSON: {e}"))
    })?;

    let encoded = parsed
        .get("os_crypt")
        .and_then(|o| o.get("encrypted_key"))
        .and_then(|k| k.as_str())
        .ok_or_else(|| {
            ChromeDumpError::KeySource("Local State has no os_crypt.encrypted_key".to_string())
        })?;

    let blob = BASE64.decode(encoded).map_err(|e| {
        ChromeDumpError::KeySource(format!("encrypted_key is not valid base64: {e}"))
    })?;

    if !blob.starts_with(DPAPI_PREFIX) {
        return Err(ChromeDumpError::KeySource(
            "encrypted_key does not carry the DPAPI tag".to_string(),
        ));
    }

    Ok(blob[DPAPI_PREFIX.len()..].to_vec())
}

impl KeySource for LocalStateKeySource {
    fn describe(&self) -> String {
        format!("DPAPI-protected key in {}", self.local_state.display())
    }

    #[cfg(windows)]
    fn fetch(&self) -> Result<MasterKey> {
        let raw = std::fs::read_to_string(&self.local_state).map_err(|e| {
            ChromeDumpError::KeySource(format!(
                "cannot read {}: {e}",
                self.local_state.display()
            ))
        })?;

        let protected = parse_local_state(&raw)?;
        Ok(MasterKey::new(dpapi_unprotect(&protected)?))
    }

    #[cfg(not(windows))]
    fn fetch(&self) -> Result<MasterKey> {
        Err(ChromeDumpError::KeySource(
            "DPAPI key unprotection is only available on Windows".to_string(),
        ))
    }
}

/// Unprotect a per-user DPAPI envelope via `CryptUnprotectData`.
#[cfg(windows)]
fn dpapi_unprotect(data: &[u8]) -> Result<Vec<u8>> {
    use std::ptr;
    use winapi::um::dpapi::CryptUnprotectData;
    use winapi::um::winbase::LocalFree;
    use winapi::um::wincrypt::CRYPTOAPI_BLOB;

    let mut input = CRYPTOAPI_BLOB {
        cbData: data.len() as u32,
        pbData: data.as_ptr() as *mut u8,
    };
    let mut output = CRYPTOAPI_BLOB {
        cbData: 0,
        pbData: ptr::null_mut(),
    };

    let ok = unsafe {
        CryptUnprotectData(
            &mut input,
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            0,
            &mut output,
        )
    };

    if ok == 0 {
        return Err(ChromeDumpError::KeySource(
            "CryptUnprotectData refused the key blob".to_string(),
        ));
    }

    let key = unsafe {
        std::slice::from_raw_parts(output.pbData, output.cbData as usize).to_vec()
    };
    unsafe {
        LocalFree(output.pbData as *mut _);
    }

    Ok(key)
}
