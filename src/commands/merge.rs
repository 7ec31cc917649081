//! `hg merge`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{CommandError, Result, Session};

/// Options for [`Session::merge`].
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Merge tool to use (`--tool`). Defaults to `internal:merge` so the
    /// server never prompts for an external editor.
    pub tool: Option<String>,
}

impl Session {
    /// Merge another revision into the working directory.
    ///
    /// Returns `true` on a clean merge and `false` when the merge ran but
    /// left unresolved files (exit code 1). Interactive prompts the server
    /// raises during the merge are answered with EOF; drive
    /// [`run_command`](Session::run_command) directly with input providers
    /// for interactive merges.
    pub async fn merge(&mut self, rev: Option<&str>, options: &MergeOptions) -> Result<bool> {
        let tool = options.tool.as_deref().unwrap_or("internal:merge");
        let mut builder = ArgBuilder::new("merge").opt("--tool", Some(tool));
        if let Some(rev) = rev {
            builder = builder.positional(&[rev]);
        }
        let argv = builder.finish();

        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?;
        match result.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(CommandError::new("merge failed", result).into()),
        }
    }
}
