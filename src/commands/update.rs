//! `hg update`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{CommandError, Error, Result, Session};

/// Options for [`Session::update`].
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Revision to update to; defaults to the tip of the current branch.
    pub rev: Option<String>,
    /// Discard uncommitted changes, no backup (`-C`). Mutually exclusive
    /// with [`check`](Self::check).
    pub clean: bool,
    /// Refuse to update when the working directory has uncommitted
    /// changes (`-c`).
    pub check: bool,
}

/// The file counts reported by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateStats {
    pub updated: u64,
    pub merged: u64,
    pub removed: u64,
    pub unresolved: u64,
}

impl Session {
    /// Update the working directory to another revision.
    ///
    /// Returns the file counts from the server's summary line. Exit code
    /// 1 (unresolved files remain) is not an error; it shows up in
    /// [`UpdateStats::unresolved`].
    pub async fn update(&mut self, options: &UpdateOptions) -> Result<UpdateStats> {
        if options.clean && options.check {
            return Err(Error::InvalidArgument(
                "cannot specify both clean and check".into(),
            ));
        }

        let argv = ArgBuilder::new("update")
            .flag(options.clean, "-C")
            .flag(options.check, "-c")
            .opt("-r", options.rev.as_deref())
            .finish();

        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?;
        if result.exit_code != 0 && result.exit_code != 1 {
            return Err(CommandError::new("update failed", result).into());
        }

        let stdout = result.stdout_text()?;
        match parse_update_stats(&stdout) {
            Some(stats) => Ok(stats),
            None => Err(CommandError::new(
                "update output did not report file counts",
                result,
            )
            .into()),
        }
    }
}

/// Parse the `N files updated, N files merged, N files removed,
/// N files unresolved` summary line.
fn parse_update_stats(stdout: &str) -> Option<UpdateStats> {
    for line in stdout.lines() {
        if !line.contains("files updated") {
            continue;
        }
        let mut counts = [0u64; 4];
        for (slot, part) in counts.iter_mut().zip(line.split(", ")) {
            *slot = part.split_whitespace().next()?.parse().ok()?;
        }
        return Some(UpdateStats {
            updated: counts[0],
            merged: counts[1],
            removed: counts[2],
            unresolved: counts[3],
        });
    }
    None
}
