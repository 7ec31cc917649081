//! Session configuration and builder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Configuration for a command-server session.
///
/// Use [`SessionConfig::builder()`] to create one.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    // Repository and server identity
    pub(crate) repo_path: Option<PathBuf>,
    pub(crate) hg_binary: PathBuf,

    // Protocol options
    pub(crate) encoding: Option<String>,
    pub(crate) config_overrides: Vec<String>,

    // Process options
    pub(crate) timeout: Option<Duration>,
    pub(crate) env_vars: HashMap<String, String>,
}

impl SessionConfig {
    /// Create a new builder with default settings.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// The repository the server was asked to serve, if any.
    pub fn repo_path(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }

    /// The binary invoked for the server (default `hg`).
    pub fn hg_binary(&self) -> &Path {
        &self.hg_binary
    }

    /// The encoding override passed to the child via `HGENCODING`, if any.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Per-command deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Extra environment variables for the child.
    pub fn env_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env_vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build the server's command line, after the binary itself.
    ///
    /// Configuration overrides are comma-joined into a single `--config`
    /// token pair.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "serve".to_string(),
            "--cmdserver".to_string(),
            "pipe".to_string(),
        ];

        if let Some(ref path) = self.repo_path {
            args.push("-R".to_string());
            args.push(path.display().to_string());
        }

        if !self.config_overrides.is_empty() {
            args.push("--config".to_string());
            args.push(self.config_overrides.join(","));
        }

        args
    }
}

/// Builder for [`SessionConfig`].
///
/// Validation happens when [`build()`](SessionConfigBuilder::build) is
/// called.
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    repo_path: Option<PathBuf>,
    hg_binary: PathBuf,
    encoding: Option<String>,
    config_overrides: Vec<String>,
    timeout: Option<Duration>,
    env_vars: HashMap<String, String>,
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self {
            repo_path: None,
            hg_binary: PathBuf::from("hg"),
            encoding: None,
            config_overrides: Vec::new(),
            timeout: None,
            env_vars: HashMap::new(),
        }
    }
}

impl SessionConfigBuilder {
    /// Serve the repository at the given path (`-R <path>`).
    pub fn repo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.repo_path = Some(path.into());
        self
    }

    /// Invoke this binary instead of `hg`.
    pub fn hg_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.hg_binary = path.into();
        self
    }

    /// Override the child's text encoding via `HGENCODING`.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Add one `section.key=value` configuration override.
    pub fn config_override(mut self, pair: impl Into<String>) -> Self {
        self.config_overrides.push(pair.into());
        self
    }

    /// Add several configuration overrides.
    pub fn config_overrides(
        mut self,
        pairs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config_overrides.extend(pairs.into_iter().map(Into::into));
        self
    }

    /// Bound each command with a deadline.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Add or override an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<SessionConfig> {
        if let Some(ref encoding) = self.encoding {
            if encoding.is_empty() {
                return Err(Error::InvalidArgument("encoding must not be empty".into()));
            }
        }
        for pair in &self.config_overrides {
            if !pair.contains('=') {
                return Err(Error::InvalidArgument(format!(
                    "config override {pair:?} is not of the form section.key=value"
                )));
            }
        }

        Ok(SessionConfig {
            repo_path: self.repo_path,
            hg_binary: self.hg_binary,
            encoding: self.encoding,
            config_overrides: self.config_overrides,
            timeout: self.timeout,
            env_vars: self.env_vars,
        })
    }
}
