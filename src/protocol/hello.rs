//! Parsing of the hello frame the server emits on startup.
//!
//! Immediately after launch the command server sends a single unsolicited
//! frame on the output channel. Its payload is a newline-delimited block of
//! `key: value` headers; `capabilities` and `encoding` are required and fix
//! the session's negotiated values once and irrevocably.

use std::collections::HashSet;

use crate::{Error, Result};

/// The negotiated handshake values from the server's hello frame.
#[derive(Debug, Clone)]
pub struct ServerHello {
    /// The text encoding the server will use for command output.
    pub encoding: String,
    /// The capability tokens advertised by the server.
    pub capabilities: HashSet<String>,
}

impl ServerHello {
    /// Parse the hello frame payload.
    ///
    /// Unknown header keys are ignored for forward compatibility; missing
    /// `capabilities` or `encoding` keys fail the handshake.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| Error::protocol("bad handshake: hello frame is not valid UTF-8"))?;

        let mut encoding = None;
        let mut capabilities = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "encoding" => encoding = Some(value.trim().to_string()),
                "capabilities" => {
                    capabilities = Some(
                        value
                            .split_whitespace()
                            .map(str::to_string)
                            .collect::<HashSet<_>>(),
                    );
                }
                _ => {}
            }
        }

        let encoding =
            encoding.ok_or_else(|| Error::protocol("bad handshake: missing encoding"))?;
        let capabilities =
            capabilities.ok_or_else(|| Error::protocol("bad handshake: missing capabilities"))?;

        Ok(Self {
            encoding,
            capabilities,
        })
    }

    /// Whether the server advertised the given capability.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains(name)
    }
}
