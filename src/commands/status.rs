//! `hg status`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{Result, Session};

/// The single-letter state Mercurial reports for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// `M`: modified.
    Modified,
    /// `A`: added.
    Added,
    /// `R`: removed.
    Removed,
    /// `C`: clean.
    Clean,
    /// `!`: missing (deleted by a non-hg command, still tracked).
    Missing,
    /// `?`: not tracked.
    Unknown,
    /// `I`: ignored.
    Ignored,
    /// ` `: origin of the previous file, listed with `--copies`.
    Origin,
}

impl StatusCode {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'M' => Some(StatusCode::Modified),
            b'A' => Some(StatusCode::Added),
            b'R' => Some(StatusCode::Removed),
            b'C' => Some(StatusCode::Clean),
            b'!' => Some(StatusCode::Missing),
            b'?' => Some(StatusCode::Unknown),
            b'I' => Some(StatusCode::Ignored),
            b' ' => Some(StatusCode::Origin),
            _ => None,
        }
    }
}

/// One line of `hg status` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// The file's state.
    pub code: StatusCode,
    /// The file path, relative to the repository root.
    pub path: String,
}

/// Options for [`Session::status`].
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Show all file states (`-A`).
    pub all: bool,
    /// Show only modified files (`-m`).
    pub modified: bool,
    /// Show only added files (`-a`).
    pub added: bool,
    /// Show only removed files (`-r`).
    pub removed: bool,
    /// Show only missing files (`-d`).
    pub deleted: bool,
    /// Show only clean files (`-c`).
    pub clean: bool,
    /// Show only unknown files (`-u`).
    pub unknown: bool,
    /// Show only ignored files (`-i`).
    pub ignored: bool,
    /// Show the source of copied files (`-C`); sources appear as
    /// [`StatusCode::Origin`] lines following the copy.
    pub copies: bool,
}

impl Session {
    /// Report the state of working-directory files.
    pub async fn status(&mut self, options: &StatusOptions) -> Result<Vec<StatusLine>> {
        let argv = ArgBuilder::new("status")
            .flag(options.all, "-A")
            .flag(options.modified, "-m")
            .flag(options.added, "-a")
            .flag(options.removed, "-r")
            .flag(options.deleted, "-d")
            .flag(options.clean, "-c")
            .flag(options.unknown, "-u")
            .flag(options.ignored, "-i")
            .flag(options.copies, "-C")
            .finish();

        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?
            .checked(0, "status failed")?;

        Ok(parse_status(&result.stdout_text()?))
    }
}

/// Parse `X path` lines. Lines with an unrecognized leading letter are
/// skipped rather than failing the whole listing.
fn parse_status(stdout: &str) -> Vec<StatusLine> {
    let mut lines = Vec::new();
    for line in stdout.lines() {
        let bytes = line.as_bytes();
        if bytes.len() < 3 || bytes[1] != b' ' {
            continue;
        }
        let Some(code) = StatusCode::from_byte(bytes[0]) else {
            continue;
        };
        lines.push(StatusLine {
            code,
            path: line[2..].to_string(),
        });
    }
    lines
}
