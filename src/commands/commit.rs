//! `hg commit`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{CommandError, Error, Result, Session};

/// Options for [`Session::commit`].
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Record the specified user as committer (`-u`).
    pub user: Option<String>,
    /// Record the specified date, formatted `yyyy-MM-dd HH:mm:ss` (`-d`).
    pub date: Option<String>,
    /// Mark new and missing files as added and removed (`-A`).
    pub add_remove: bool,
    /// Mark the branch head as closed (`--close-branch`).
    pub close_branch: bool,
    /// Amend the parent of the working directory (`--amend`).
    pub amend: bool,
}

impl Session {
    /// Commit the working directory's changes.
    ///
    /// Returns the local revision number and full node hash of the new
    /// changeset, parsed from the server's `--debug` output.
    pub async fn commit(
        &mut self,
        message: &str,
        options: &CommitOptions,
    ) -> Result<(u64, String)> {
        if message.is_empty() {
            return Err(Error::InvalidArgument(
                "commit message must not be empty".into(),
            ));
        }

        let argv = ArgBuilder::new("commit")
            .flag(true, "--debug")
            .opt("-m", Some(message))
            .opt("-u", options.user.as_deref())
            .opt("-d", options.date.as_deref())
            .flag(options.add_remove, "-A")
            .flag(options.close_branch, "--close-branch")
            .flag(options.amend, "--amend")
            .finish();

        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?
            .checked(0, "commit failed")?;

        let stdout = result.stdout_text()?;
        match parse_committed(&stdout) {
            Some(parsed) => Ok(parsed),
            None => Err(CommandError::new(
                "commit output did not report a committed changeset",
                result,
            )
            .into()),
        }
    }
}

/// Extract `(rev, node)` from the `committed changeset REV:NODE` debug
/// line.
fn parse_committed(stdout: &str) -> Option<(u64, String)> {
    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix("committed changeset ") {
            let (rev, node) = rest.trim().split_once(':')?;
            return Some((rev.parse().ok()?, node.to_string()));
        }
    }
    None
}
