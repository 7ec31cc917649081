//! `hg add`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{CommandError, Result, Session};

impl Session {
    /// Schedule files to be version controlled and added to the
    /// repository at the next commit. With no files, adds everything
    /// under the working directory.
    ///
    /// Returns `false` when some of the files could not be added
    /// (exit code 1).
    pub async fn add<S: AsRef<str>>(&mut self, files: &[S]) -> Result<bool> {
        let argv = ArgBuilder::new("add").positional(files).finish();
        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?;
        match result.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(CommandError::new("add failed", result).into()),
        }
    }
}
