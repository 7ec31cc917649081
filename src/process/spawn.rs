//! Spawning and lifecycle management for the command-server child.

use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use super::SHUTDOWN_GRACE;
use crate::config::SessionConfig;
use crate::{Error, Result};

/// A running `hg serve --cmdserver pipe` child process.
///
/// The process stays alive for the lifetime of a session and serves many
/// commands over its pipes.
///
/// # Cleanup
///
/// Dropping an `HgProcess` kills the child if it is still running. For an
/// orderly exit, close the child's stdin first and call
/// [`shutdown`](Self::shutdown), which waits out [`SHUTDOWN_GRACE`] before
/// escalating to a kill.
#[derive(Debug)]
pub struct HgProcess {
    child: Child,
}

impl HgProcess {
    /// Launch the command server described by `config`.
    ///
    /// All three standard streams are piped and owned by the library. The
    /// parent environment is propagated; `HGENCODING` is set when the
    /// config carries an encoding override.
    pub fn spawn(config: &SessionConfig) -> Result<Self> {
        let mut cmd = Command::new(config.hg_binary());
        cmd.args(config.build_args());

        if let Some(encoding) = config.encoding() {
            cmd.env("HGENCODING", encoding);
        }
        for (key, value) in config.env_vars() {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(binary = %config.hg_binary().display(), "launching command server");

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::HgNotFound {
                    searched: config.hg_binary().display().to_string(),
                }
            } else {
                Error::Launch(e)
            }
        })?;

        Ok(Self { child })
    }

    /// Take the child's stdin. Can only be taken once.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Take the child's stdout. Can only be taken once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take a reader over the child's stderr. Can only be taken once.
    pub fn take_stderr_reader(&mut self) -> Option<StderrReader> {
        self.child.stderr.take().map(StderrReader::new)
    }

    /// The process ID of the running server.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Check if the process is still running.
    pub fn is_running(&self) -> bool {
        self.child.id().is_some()
    }

    /// Wait for the server to exit. The caller should have closed the
    /// child's stdin first so the server sees end of input.
    ///
    /// If the server is still alive after [`SHUTDOWN_GRACE`], it is killed
    /// and reaped.
    pub async fn shutdown(&mut self) -> Result<()> {
        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(Error::io)?;
                tracing::debug!(?status, "command server exited");
                Ok(())
            }
            Err(_) => {
                tracing::warn!("command server did not exit within grace window, killing");
                self.child.kill().await.map_err(Error::io)?;
                Ok(())
            }
        }
    }

    /// Kill the process immediately and reap it.
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await.map_err(Error::io)
    }

    /// Try to kill the process without waiting for it to be reaped.
    pub fn start_kill(&mut self) -> Result<()> {
        self.child.start_kill().map_err(Error::io)
    }
}

impl Drop for HgProcess {
    fn drop(&mut self) {
        let _ = self.start_kill();
    }
}

/// Upper bound on captured stderr diagnostics. The command server routes
/// command errors over the `e` channel; stderr only ever carries launch
/// and crash noise, which never needs more than this to be useful.
const DIAGNOSTICS_CAP: usize = 8 * 1024;

/// Reads diagnostics from the server's stderr.
///
/// The command server never speaks protocol on stderr; anything there is a
/// launch or crash diagnostic, collected for error reporting.
#[derive(Debug)]
pub struct StderrReader {
    stderr: ChildStderr,
}

impl StderrReader {
    fn new(stderr: ChildStderr) -> Self {
        Self { stderr }
    }

    /// Collect stderr diagnostics until EOF or the capture cap, whichever
    /// comes first.
    ///
    /// Capture is capped the same way the driver caps prompt replies, so
    /// a crashing child spewing output cannot balloon an error message.
    /// Diagnostics are decoded lossily; they are for humans, not for the
    /// protocol.
    pub async fn collect_diagnostics(mut self) -> Result<String> {
        let mut captured = vec![0u8; DIAGNOSTICS_CAP];
        let mut filled = 0;
        while filled < captured.len() {
            let n = self
                .stderr
                .read(&mut captured[filled..])
                .await
                .map_err(Error::io)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        captured.truncate(filled);
        Ok(String::from_utf8_lossy(&captured).into_owned())
    }
}
