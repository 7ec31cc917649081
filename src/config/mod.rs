//! Session configuration for the command-server client.
//!
//! This module provides [`SessionConfig`] and [`SessionConfigBuilder`] for
//! describing how the `hg` child process is launched: which repository to
//! serve, the text encoding, ad-hoc configuration overrides, and the binary
//! to invoke.
//!
//! # Example
//!
//! ```ignore
//! use libhg::config::SessionConfig;
//!
//! let config = SessionConfig::builder()
//!     .repo_path("/srv/repos/project")
//!     .encoding("UTF-8")
//!     .config_override("ui.username=ci-bot")
//!     .build()?;
//! ```

mod builder;

pub use builder::{SessionConfig, SessionConfigBuilder};
