//! `hg pull`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{CommandError, Result, Session};

/// Options for [`Session::pull`].
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Update to the new branch head after the pull (`-u`).
    pub update: bool,
    /// Run even when the remote repository is unrelated (`-f`).
    pub force: bool,
    /// Pull the specified revisions only (`-r`, repeatable).
    pub revs: Vec<String>,
    /// Pull the specified branches only (`-b`, repeatable).
    pub branches: Vec<String>,
}

impl Session {
    /// Pull changes from a remote repository (or the default path).
    ///
    /// Returns `true` on a clean pull and `false` when the pull ran but
    /// an update left unresolved files (exit code 1). Any other non-zero
    /// exit code is a [`CommandError`](crate::CommandError).
    pub async fn pull(&mut self, source: Option<&str>, options: &PullOptions) -> Result<bool> {
        let mut builder = ArgBuilder::new("pull")
            .flag(options.update, "-u")
            .flag(options.force, "-f")
            .many("-r", &options.revs)
            .many("-b", &options.branches);
        if let Some(source) = source {
            builder = builder.positional(&[source]);
        }
        let argv = builder.finish();

        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?;
        match result.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(CommandError::new("pull failed", result).into()),
        }
    }
}
