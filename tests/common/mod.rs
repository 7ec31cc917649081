//! Test utilities for libhg integration tests.

#[cfg(unix)]
use std::path::{Path, PathBuf};

/// Builds the raw wire bytes a command server would emit, frame by frame.
///
/// The result is fed to the command driver (or a fake server process) as
/// its stdout stream.
pub struct ScenarioBuilder {
    wire: Vec<u8>,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self { wire: Vec::new() }
    }

    fn frame(mut self, channel: u8, payload: &[u8]) -> Self {
        self.wire.push(channel);
        self.wire
            .extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.wire.extend_from_slice(payload);
        self
    }

    /// The hello frame: an output-channel frame with the handshake block.
    pub fn hello(self, encoding: &str, capabilities: &str) -> Self {
        let payload = format!("capabilities: {capabilities}\nencoding: {encoding}");
        self.frame(b'o', payload.as_bytes())
    }

    /// An output-channel data frame.
    pub fn output(self, payload: &[u8]) -> Self {
        self.frame(b'o', payload)
    }

    /// An error-channel data frame.
    pub fn error_output(self, payload: &[u8]) -> Self {
        self.frame(b'e', payload)
    }

    /// A debug-channel data frame.
    pub fn debug(self, payload: &[u8]) -> Self {
        self.frame(b'd', payload)
    }

    /// A line-input prompt advertising the given reply cap.
    pub fn line_prompt(mut self, cap: u32) -> Self {
        self.wire.push(b'L');
        self.wire.extend_from_slice(&cap.to_be_bytes());
        self
    }

    /// A byte-input prompt advertising the given reply cap.
    pub fn byte_prompt(mut self, cap: u32) -> Self {
        self.wire.push(b'I');
        self.wire.extend_from_slice(&cap.to_be_bytes());
        self
    }

    /// The terminal result frame with a signed 32-bit exit code.
    pub fn result(self, code: i32) -> Self {
        let payload = code.to_be_bytes();
        self.frame(b'r', &payload)
    }

    /// Arbitrary bytes, for malformed-stream scenarios.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.wire.extend_from_slice(bytes);
        self
    }

    /// The assembled wire bytes.
    pub fn build(self) -> Vec<u8> {
        self.wire
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a fake command-server executable into `dir`.
///
/// The script ignores its arguments, plays back `wire` on stdout, then
/// copies its stdin to `input.bin` until EOF so the process stays alive
/// like a real server waiting for requests, and so tests can inspect what
/// the client actually sent.
#[cfg(unix)]
pub fn fake_server(dir: &Path, wire: &[u8]) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let wire_path = dir.join("wire.bin");
    std::fs::write(&wire_path, wire).expect("write wire bytes");

    let script_path = dir.join("fake-hg");
    let script = format!(
        "#!/bin/sh\ncat '{}'\nexec tee '{}' >/dev/null\n",
        wire_path.display(),
        dir.join("input.bin").display()
    );
    std::fs::write(&script_path, script).expect("write fake server script");
    std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755))
        .expect("mark fake server executable");

    script_path
}

/// The bytes the client sent to a [`fake_server`]'s stdin.
#[cfg(unix)]
pub fn sent_to_server(dir: &Path) -> Vec<u8> {
    std::fs::read(dir.join("input.bin")).unwrap_or_default()
}
