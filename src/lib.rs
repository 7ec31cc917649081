//! # libhg
//!
//! Async Rust client for the Mercurial command server.
//!
//! The command server (`hg serve --cmdserver pipe`) is a long-running child
//! process that accepts commands and streams responses over a framed,
//! binary protocol on its standard pipes. By keeping one process alive
//! across many commands, this library amortizes Mercurial's startup cost
//! and offers a typed programmatic interface to common operations.
//!
//! ## Quick Start
//!
//! ```ignore
//! use libhg::{HgClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HgClient::builder().repo_path("/srv/repos/project").build()?;
//!     let mut session = client.open().await?;
//!
//!     println!("repository root: {}", session.root().await?);
//!     for change in session.log(&Default::default()).await? {
//!         println!("{}: {}", change.rev, change.message);
//!     }
//!
//!     session.close().await
//! }
//! ```
//!
//! ## Raw commands
//!
//! Anything the adapters do not cover can be run directly. Output channels
//! are routed to caller-supplied sinks and input prompts to caller-supplied
//! providers:
//!
//! ```ignore
//! use libhg::{InputProviders, OutputSinks};
//!
//! let mut stdout = Vec::new();
//! let mut sinks = OutputSinks { output: Some(&mut stdout), ..Default::default() };
//! let code = session
//!     .run_command(&["annotate", "src/main.rs"], &mut sinks, &mut InputProviders::none())
//!     .await?;
//! ```
//!
//! Or with captured buffers and the negotiated encoding applied:
//!
//! ```ignore
//! let result = session.get_command_output(&["branches"], &mut Default::default()).await?;
//! print!("{}", result.stdout_text()?);
//! ```
//!
//! ## Lifecycle
//!
//! A [`Session`] owns its child process and guarantees release on every
//! exit path: [`Session::close`] shuts the server down politely, dropping
//! the session kills it, and protocol failures terminate it eagerly.
//! Non-zero exit codes are never errors by themselves; convert them with
//! [`CommandResult::checked`] where they should be.

mod client;
mod error;
mod session;

// Public modules for advanced usage
pub mod commands;
pub mod config;
pub mod driver;
pub mod process;
pub mod protocol;

// ============================================================================
// Core types
// ============================================================================

pub use client::{HgClient, HgClientBuilder};
pub use error::{CommandError, Error, Result};
pub use session::{CancelHandle, Session};

// ============================================================================
// Command execution
// ============================================================================

pub use driver::{CommandResult, InputProvider, InputProviders, OutputSinks};

// ============================================================================
// Configuration
// ============================================================================

pub use config::{SessionConfig, SessionConfigBuilder};

// ============================================================================
// Protocol types
// ============================================================================

pub use protocol::{Channel, ChannelClass, Frame, ServerHello};

// ============================================================================
// Subcommand adapters
// ============================================================================

pub use commands::{
    CloneOptions, CommitOptions, ConfigEntry, DiffOptions, LogOptions, MergeOptions, PullOptions,
    PushOptions, Revision, StatusCode, StatusLine, StatusOptions, UpdateOptions, UpdateStats,
};
