//! `chromedump key` — probe master-key availability without dumping.
//!
//! Reports where the key would come from and whether it can be
//! recovered. Never prints key material.

use crate::cli::{output, resolve_browser, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::keysource;

/// Execute the `key` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = Settings::load(&std::env::current_dir()?)?;
    let browser = resolve_browser(cli, &settings)?;
    let source = keysource::platform_source(browser);

    output::info(&format!("Key source: {}", source.describe()));

    match source.fetch() {
        Ok(key) => {
            output::success(&format!("Recovered a {}-byte master key", key.len()));
            Ok(())
        }
        Err(e) => {
            output::tip("Dumps will still run; encrypted cells fall back to best-effort decoding.");
            Err(e)
        }
    }
}
