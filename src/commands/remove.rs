//! `hg remove`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{CommandError, Error, Result, Session};

impl Session {
    /// Schedule files to be removed from the repository at the next
    /// commit.
    ///
    /// Returns `false` when some of the files could not be removed
    /// (exit code 1).
    pub async fn remove<S: AsRef<str>>(&mut self, files: &[S]) -> Result<bool> {
        if files.is_empty() {
            return Err(Error::InvalidArgument("remove requires files".into()));
        }
        let argv = ArgBuilder::new("remove").positional(files).finish();
        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?;
        match result.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(CommandError::new("remove failed", result).into()),
        }
    }
}
