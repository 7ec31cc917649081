use std::time::Duration;

use crate::driver::CommandResult;

/// Errors that can occur when using libhg.
///
/// Errors are organized by category:
/// - Argument errors: caller-side contract violations, no child-state effect
/// - Launch errors: the `hg` child process failed to start
/// - Protocol errors: the framed stream from the child was malformed
/// - IO errors: communication failures on the child's pipes
/// - Command errors: a command ran but its exit code was deemed fatal
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Argument errors (raised synchronously, session unaffected)
    // -------------------------------------------------------------------------
    /// The caller violated an API contract (empty argv, conflicting options).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The session was closed; no further operations are possible on it.
    #[error("session is closed")]
    SessionClosed,

    // -------------------------------------------------------------------------
    // Launch errors
    // -------------------------------------------------------------------------
    /// The `hg` binary was not found.
    #[error("hg binary not found (searched: {searched})")]
    HgNotFound { searched: String },

    /// Failed to spawn the command-server child process.
    #[error("failed to launch hg command server: {0}")]
    Launch(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol errors (always tear down the session)
    // -------------------------------------------------------------------------
    /// The framed stream from the child violated the protocol.
    ///
    /// Covers malformed headers, unknown channel bytes, truncated payloads,
    /// missing handshake keys, and early termination. There is no attempt to
    /// resynchronize a misframed stream; the session is closed.
    #[error("command server protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // IO errors
    // -------------------------------------------------------------------------
    /// IO error on the child's pipes or a caller-supplied sink/provider.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Command errors (session remains usable)
    // -------------------------------------------------------------------------
    /// A command ran to completion with an exit code the caller deemed fatal.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Captured output was not valid text in the session's negotiated
    /// encoding. The raw bytes remain available on the
    /// [`CommandResult`](crate::CommandResult).
    #[error("output is not valid {encoding} text: {source}")]
    Decode {
        encoding: String,
        #[source]
        source: std::str::Utf8Error,
    },

    // -------------------------------------------------------------------------
    // Runtime errors
    // -------------------------------------------------------------------------
    /// A command exceeded the session's configured deadline.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// An in-flight command was cancelled via [`CancelHandle`](crate::CancelHandle).
    #[error("command cancelled")]
    Cancelled,
}

/// A specialized Result type for libhg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A command completed with an exit code the caller considered fatal.
///
/// Carries the full [`CommandResult`] so callers can inspect the captured
/// output of the failed command.
#[derive(thiserror::Error, Debug)]
#[error("{message} (exit code {})", .result.exit_code)]
pub struct CommandError {
    /// Human-readable description of what was being attempted.
    pub message: String,
    /// The captured output and exit code that produced this error.
    pub result: CommandResult,
}

impl CommandError {
    /// Create a command error from a message and the offending result.
    pub fn new(message: impl Into<String>, result: CommandResult) -> Self {
        Self {
            message: message.into(),
            result,
        }
    }
}

impl Error {
    /// Create a protocol error.
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create an IO error.
    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io(source)
    }

    /// Whether this error closed the session that produced it.
    ///
    /// Protocol, IO, timeout, and cancellation failures terminate the child
    /// and invalidate the session. Argument and command errors do not.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            Error::Protocol(_) | Error::Io(_) | Error::Timeout(_) | Error::Cancelled
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
