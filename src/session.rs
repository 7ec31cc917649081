//! Command-server sessions.
//!
//! A [`Session`] owns one `hg serve --cmdserver pipe` child process and both
//! directions of its pipes. It is created by [`HgClient::open`], consumes
//! the server's hello frame, and then serves any number of commands before
//! being closed.
//!
//! # Serialization
//!
//! All command methods take `&mut self`: at any moment the pipes belong to
//! exactly one in-flight command, and request/result association is
//! positional. Open several sessions for parallelism; they need no
//! coordination with each other.
//!
//! # Lifecycle
//!
//! `Launching → Handshaking → Ready → (RunningCommand → Ready)* → Closed`.
//! A protocol or IO failure during a command terminates the child and
//! closes the session; command-level non-zero exit codes do not.
//!
//! [`HgClient::open`]: crate::HgClient::open

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::watch;

use crate::commands::ConfigEntry;
use crate::config::SessionConfig;
use crate::driver::{self, CommandResult, InputProviders, OutputSinks};
use crate::process::{HgProcess, StderrReader};
use crate::protocol::{read_frame, Channel, ServerHello};
use crate::{Error, Result};

/// The capability gating command execution.
const RUNCOMMAND: &str = "runcommand";

/// How long the open path waits for stderr diagnostics after a failed
/// handshake.
const DIAGNOSTICS_WINDOW: Duration = Duration::from_secs(1);

/// An open connection to a Mercurial command server.
///
/// # Example
///
/// ```ignore
/// use libhg::HgClient;
///
/// let mut session = HgClient::builder()
///     .repo_path("/srv/repos/project")
///     .build()?
///     .open()
///     .await?;
///
/// let result = session.get_command_output(&["log", "--limit", "3"], &mut Default::default()).await?;
/// println!("{}", result.stdout_text()?);
/// session.close().await?;
/// ```
#[derive(Debug)]
pub struct Session {
    process: HgProcess,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr: Option<StderrReader>,
    hello: ServerHello,
    config: Arc<SessionConfig>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
    closed: bool,

    // Memoized on first query; immutable for the life of the repository
    // as far as this session is concerned.
    root: Option<String>,
    version: Option<String>,
    config_entries: Option<Vec<ConfigEntry>>,
}

impl Session {
    /// Launch the server and perform the handshake.
    pub(crate) async fn open(config: Arc<SessionConfig>) -> Result<Self> {
        let mut process = HgProcess::spawn(&config)?;

        let stdin = process.take_stdin().expect("stdin was configured");
        let mut stdout =
            BufReader::new(process.take_stdout().expect("stdout was configured"));
        let stderr = process.take_stderr_reader().expect("stderr was configured");

        match Self::handshake(&mut stdout).await {
            Ok(hello) => {
                tracing::debug!(
                    encoding = %hello.encoding,
                    capabilities = hello.capabilities.len(),
                    "handshake complete"
                );
                let (cancel_tx, cancel_rx) = watch::channel(false);
                Ok(Self {
                    process,
                    stdin: Some(stdin),
                    stdout: Some(stdout),
                    stderr: Some(stderr),
                    hello,
                    config,
                    cancel_tx: Arc::new(cancel_tx),
                    cancel_rx,
                    closed: false,
                    root: None,
                    version: None,
                    config_entries: None,
                })
            }
            Err(mut err) => {
                let _ = process.kill().await;
                if let Some(diagnostics) = Self::drain_diagnostics(stderr).await {
                    if let Error::Protocol(message) = &mut err {
                        *message = format!("{message}: {diagnostics}");
                    }
                }
                Err(err)
            }
        }
    }

    /// Read and parse the single unsolicited hello frame.
    async fn handshake(stdout: &mut BufReader<ChildStdout>) -> Result<ServerHello> {
        let frame = read_frame(stdout)
            .await?
            .ok_or_else(|| Error::protocol("bad handshake: server closed the stream"))?;
        if frame.channel != Channel::Output {
            return Err(Error::protocol(format!(
                "bad handshake: hello arrived on channel {}",
                frame.channel
            )));
        }
        ServerHello::parse(&frame.payload)
    }

    /// Best-effort collection of stderr output from a dead child.
    async fn drain_diagnostics(stderr: StderrReader) -> Option<String> {
        match tokio::time::timeout(DIAGNOSTICS_WINDOW, stderr.collect_diagnostics()).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        }
    }

    /// The text encoding negotiated at handshake.
    pub fn encoding(&self) -> &str {
        &self.hello.encoding
    }

    /// The capability set advertised at handshake.
    pub fn capabilities(&self) -> &HashSet<String> {
        &self.hello.capabilities
    }

    /// Whether the server advertised the given capability.
    pub fn has_capability(&self, name: &str) -> bool {
        self.hello.has_capability(name)
    }

    /// The server's process ID, while it is running.
    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    /// Whether the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// A handle that can interrupt this session's in-flight command from
    /// another task. Cancellation closes the session.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    /// Run one command on the server.
    ///
    /// `argv` is the Mercurial command line (subcommand first), without the
    /// `hg` binary itself. Data frames are routed to `sinks`; input prompts
    /// are answered by `providers`. Returns the command's exit code: a
    /// non-zero code is not an error here; converting it into one is the
    /// caller's decision (see [`CommandResult::checked`]).
    ///
    /// A protocol or IO failure terminates the child and closes the
    /// session. If the session was configured with a timeout, the command
    /// is abandoned (and the session closed) when the deadline passes.
    pub async fn run_command<S: AsRef<str>>(
        &mut self,
        argv: &[S],
        sinks: &mut OutputSinks<'_>,
        providers: &mut InputProviders<'_>,
    ) -> Result<i32> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        if argv.is_empty() {
            return Err(Error::InvalidArgument("argv must not be empty".into()));
        }
        if !self.hello.has_capability(RUNCOMMAND) {
            return Err(Error::protocol("unsupported capability: runcommand"));
        }

        let deadline = self.config.timeout();
        let mut cancel_rx = self.cancel_rx.clone();

        let outcome = {
            let stdin = self.stdin.as_mut().ok_or(Error::SessionClosed)?;
            let stdout = self.stdout.as_mut().ok_or(Error::SessionClosed)?;

            let drive = driver::run_command(stdout, stdin, argv, sinks, providers);
            tokio::pin!(drive);

            let expire = async {
                match deadline {
                    Some(duration) => tokio::time::sleep(duration).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                result = &mut drive => result,
                _ = cancel_rx.wait_for(|cancelled| *cancelled) => Err(Error::Cancelled),
                _ = expire => Err(Error::Timeout(deadline.unwrap_or(Duration::ZERO))),
            }
        };

        match outcome {
            Ok(code) => Ok(code),
            Err(err) => {
                if err.is_fatal_to_session() {
                    self.teardown(matches!(err, Error::Cancelled)).await;
                }
                Err(err)
            }
        }
    }

    /// Run one command and capture its output.
    ///
    /// Binds in-memory buffers to the output and error channels, forwards
    /// `providers` unchanged, and decodes nothing eagerly: the returned
    /// [`CommandResult`] carries raw bytes, the exit code, and the
    /// session's negotiated encoding.
    pub async fn get_command_output<S: AsRef<str>>(
        &mut self,
        argv: &[S],
        providers: &mut InputProviders<'_>,
    ) -> Result<CommandResult> {
        let encoding = self.hello.encoding.clone();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let exit_code = {
            let mut sinks = OutputSinks {
                output: Some(&mut stdout),
                error: Some(&mut stderr),
                debug: None,
            };
            self.run_command(argv, &mut sinks, providers).await?
        };

        Ok(CommandResult {
            stdout,
            stderr,
            exit_code,
            encoding,
        })
    }

    /// The repository root path, queried once and cached.
    pub async fn root(&mut self) -> Result<&str> {
        if self.root.is_none() {
            let result = self
                .get_command_output(&["root"], &mut InputProviders::none())
                .await?
                .checked(0, "root query failed")?;
            self.root = Some(result.stdout_text()?.trim_end_matches('\n').to_string());
        }
        Ok(self.root.as_deref().unwrap_or_default())
    }

    /// The server's Mercurial version string, queried once and cached.
    pub async fn version(&mut self) -> Result<&str> {
        if self.version.is_none() {
            let result = self
                .get_command_output(&["version", "-q"], &mut InputProviders::none())
                .await?
                .checked(0, "version query failed")?;
            let text = result.stdout_text()?;
            let first = text.lines().next().unwrap_or_default();
            let version = first
                .rsplit_once("(version ")
                .and_then(|(_, rest)| rest.strip_suffix(')'))
                .unwrap_or(first)
                .trim()
                .to_string();
            self.version = Some(version);
        }
        Ok(self.version.as_deref().unwrap_or_default())
    }

    /// The server's effective configuration, queried once and cached.
    pub async fn config_entries(&mut self) -> Result<&[ConfigEntry]> {
        if self.config_entries.is_none() {
            let entries = self.show_config::<&str>(&[]).await?;
            self.config_entries = Some(entries);
        }
        Ok(self.config_entries.as_deref().unwrap_or_default())
    }

    /// Close the session, terminating the server.
    ///
    /// The child's stdin is closed first so the server can exit on its own;
    /// after [`SHUTDOWN_GRACE`](crate::process::SHUTDOWN_GRACE) it is
    /// killed. Calling `close` more than once is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        tracing::debug!("closing session");
        self.teardown(true).await;
        Ok(())
    }

    /// Terminate the child and invalidate the session.
    async fn teardown(&mut self, graceful: bool) {
        self.stdin.take();
        self.stdout.take();
        self.stderr.take();
        if graceful {
            let _ = self.process.shutdown().await;
        } else {
            let _ = self.process.kill().await;
        }
        self.closed = true;
    }
}

/// A clonable handle that cancels a session's in-flight command.
///
/// Obtained from [`Session::cancel_handle`]. After cancellation the
/// interrupted `run_command` fails with [`Error::Cancelled`] and the
/// session is closed.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel the session's in-flight command, if any.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}
