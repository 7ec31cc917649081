//! `hg clone`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{Result, Session};

/// Options for [`Session::clone_repo`].
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Do not update the new working directory (`--noupdate`).
    pub noupdate: bool,
    /// Revision, tag, or branch to check out (`--updaterev`).
    pub updaterev: Option<String>,
    /// Include the specified changesets only (`--rev`, repeatable).
    pub revs: Vec<String>,
    /// Clone only the specified branches (`--branch`, repeatable).
    pub branches: Vec<String>,
    /// Use pull protocol to copy metadata (`--pull`).
    pub pull: bool,
}

impl Session {
    /// Make a copy of an existing repository.
    ///
    /// With `dest = None` Mercurial derives the destination from the
    /// source basename.
    pub async fn clone_repo(
        &mut self,
        source: &str,
        dest: Option<&str>,
        options: &CloneOptions,
    ) -> Result<()> {
        let mut builder = ArgBuilder::new("clone")
            .flag(options.noupdate, "--noupdate")
            .flag(options.pull, "--pull")
            .opt("--updaterev", options.updaterev.as_deref())
            .many("--rev", &options.revs)
            .many("--branch", &options.branches)
            .positional(&[source]);
        if let Some(dest) = dest {
            builder = builder.positional(&[dest]);
        }
        let argv = builder.finish();

        self.get_command_output(&argv, &mut InputProviders::none())
            .await?
            .checked(0, "clone failed")?;
        Ok(())
    }
}
