//! High-level client for opening command-server sessions.
//!
//! This module provides [`HgClient`], the main entry point of the crate.
//!
//! # Example
//!
//! ```ignore
//! use libhg::{HgClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HgClient::builder()
//!         .repo_path("/srv/repos/project")
//!         .build()?;
//!
//!     let mut session = client.open().await?;
//!     println!("server encoding: {}", session.encoding());
//!
//!     let result = session
//!         .get_command_output(&["status"], &mut Default::default())
//!         .await?;
//!     print!("{}", result.stdout_text()?);
//!
//!     session.close().await
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::config::{SessionConfig, SessionConfigBuilder};
use crate::session::Session;
use crate::Result;

/// A client for the Mercurial command server.
///
/// The client holds a launch configuration; every [`open`](Self::open) call
/// starts a fresh server child and hands back a [`Session`]. Sessions are
/// independent: open several to run commands in parallel.
#[derive(Debug, Clone)]
pub struct HgClient {
    config: Arc<SessionConfig>,
}

impl HgClient {
    /// Create a client with default configuration (the `hg` on `PATH`,
    /// no repository preselected).
    pub fn new() -> Result<Self> {
        let config = SessionConfig::builder().build()?;
        Ok(Self::with_config(config))
    }

    /// Create a client from an existing configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Create a builder for configuring a new client.
    pub fn builder() -> HgClientBuilder {
        HgClientBuilder::new()
    }

    /// Launch a command server and perform the handshake.
    ///
    /// The returned [`Session`] owns the child process; dropping it kills
    /// the child, and [`Session::close`] shuts it down in an orderly way.
    pub async fn open(&self) -> Result<Session> {
        Session::open(Arc::clone(&self.config)).await
    }

    /// The client's launch configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Builder for [`HgClient`].
///
/// Wraps [`SessionConfigBuilder`] and builds directly into a client.
#[derive(Debug, Clone, Default)]
pub struct HgClientBuilder {
    inner: SessionConfigBuilder,
}

impl HgClientBuilder {
    /// Create a new client builder with default settings.
    pub fn new() -> Self {
        Self {
            inner: SessionConfigBuilder::default(),
        }
    }

    /// Serve the repository at the given path.
    pub fn repo_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.repo_path(path);
        self
    }

    /// Invoke this binary instead of `hg`.
    pub fn hg_binary(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.hg_binary(path);
        self
    }

    /// Override the child's text encoding via `HGENCODING`.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.inner = self.inner.encoding(encoding);
        self
    }

    /// Add one `section.key=value` configuration override.
    pub fn config_override(mut self, pair: impl Into<String>) -> Self {
        self.inner = self.inner.config_override(pair);
        self
    }

    /// Add several configuration overrides.
    pub fn config_overrides(
        mut self,
        pairs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.inner = self.inner.config_overrides(pairs);
        self
    }

    /// Bound each command with a deadline.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.inner = self.inner.timeout(duration);
        self
    }

    /// Add or override an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner = self.inner.env(key, value);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<HgClient> {
        let config = self.inner.build()?;
        Ok(HgClient::with_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn client_is_send_sync_clone() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<HgClient>();
        assert_send_sync::<HgClientBuilder>();
    }

    #[test]
    fn builder_builds_default_client() {
        let client = HgClient::builder().build().unwrap();
        assert_eq!(client.config().hg_binary(), Path::new("hg"));
    }

    #[test]
    fn builder_chains_options() {
        let client = HgClient::builder()
            .repo_path("/tmp/repo")
            .encoding("UTF-8")
            .config_override("ui.username=test")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(client.config().repo_path(), Some(Path::new("/tmp/repo")));
        assert_eq!(client.config().encoding(), Some("UTF-8"));
        assert_eq!(client.config().timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn invalid_override_fails_build() {
        assert!(HgClient::builder().config_override("bogus").build().is_err());
    }
}
