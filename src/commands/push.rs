//! `hg push`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{CommandError, Result, Session};

/// Options for [`Session::push`].
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Force the push (`-f`).
    pub force: bool,
    /// Push the specified revisions only (`-r`, repeatable).
    pub revs: Vec<String>,
    /// Push the specified branches only (`-b`, repeatable).
    pub branches: Vec<String>,
    /// Allow pushing a new branch (`--new-branch`).
    pub new_branch: bool,
}

impl Session {
    /// Push changes to a remote repository (or the default path).
    ///
    /// Returns `true` when changesets were pushed and `false` when there
    /// was nothing to push (exit code 1). Any other non-zero exit code is
    /// a [`CommandError`](crate::CommandError).
    pub async fn push(&mut self, dest: Option<&str>, options: &PushOptions) -> Result<bool> {
        let mut builder = ArgBuilder::new("push")
            .flag(options.force, "-f")
            .flag(options.new_branch, "--new-branch")
            .many("-r", &options.revs)
            .many("-b", &options.branches);
        if let Some(dest) = dest {
            builder = builder.positional(&[dest]);
        }
        let argv = builder.finish();

        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?;
        match result.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(CommandError::new("push failed", result).into()),
        }
    }
}
