//! `hg diff`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{Error, Result, Session};

/// Options for [`Session::diff`].
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Limit the diff to these files.
    pub files: Vec<String>,
    /// Compare against the specified revisions (`-r`, at most two).
    /// Mutually exclusive with [`change`](Self::change).
    pub revs: Vec<String>,
    /// Show the changes introduced by one revision (`--change`).
    pub change: Option<String>,
    /// Use git extended diff format (`--git`).
    pub git: bool,
    /// Produce a diff that undoes the changes (`--reverse`).
    pub reverse: bool,
    /// Ignore white space when comparing lines (`-w`).
    pub ignore_all_space: bool,
}

impl Session {
    /// Show differences between revisions or against the working
    /// directory.
    ///
    /// Returns the raw diff bytes; diffs of binary files are not valid
    /// text.
    pub async fn diff(&mut self, options: &DiffOptions) -> Result<Vec<u8>> {
        if options.change.is_some() && !options.revs.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot specify both revs and change".into(),
            ));
        }

        let argv = ArgBuilder::new("diff")
            .flag(options.git, "--git")
            .flag(options.reverse, "--reverse")
            .flag(options.ignore_all_space, "-w")
            .opt("--change", options.change.as_deref())
            .many("-r", &options.revs)
            .positional(&options.files)
            .finish();

        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?
            .checked(0, "diff failed")?;

        Ok(result.stdout)
    }
}
