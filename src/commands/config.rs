//! `hg showconfig`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{Result, Session};

/// One effective configuration value, as reported by `showconfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// The configuration section (the part before the first dot).
    pub section: String,
    /// The key within the section.
    pub name: String,
    /// The effective value.
    pub value: String,
}

impl Session {
    /// Show the server's effective configuration.
    ///
    /// `names` restricts the listing to specific sections or
    /// `section.name` keys; empty lists everything. The full listing is
    /// also available memoized via
    /// [`config_entries`](Session::config_entries).
    pub async fn show_config<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<ConfigEntry>> {
        let argv = ArgBuilder::new("showconfig").positional(names).finish();
        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?
            .checked(0, "showconfig failed")?;
        Ok(parse_config(&result.stdout_text()?))
    }
}

/// Parse `section.name=value` lines. Lines that do not match (warnings,
/// untrusted-file notices) are skipped.
fn parse_config(stdout: &str) -> Vec<ConfigEntry> {
    let mut entries = Vec::new();
    for line in stdout.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some((section, name)) = key.split_once('.') else {
            continue;
        };
        entries.push(ConfigEntry {
            section: section.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    entries
}
