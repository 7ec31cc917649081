//! The command execution driver.
//!
//! [`run_command`] serializes one `runcommand` request, then loops over the
//! multiplexed inbound frames until the terminal result frame arrives,
//! routing each frame to the caller-supplied sink or input provider. It is
//! generic over the transport so tests can drive it with in-memory readers
//! and writers instead of a live child process.
//!
//! Callers normally reach this through [`Session::run_command`] and
//! [`Session::get_command_output`], which add capability gating, lifecycle
//! handling, and cancellation on top.
//!
//! [`Session::run_command`]: crate::Session::run_command
//! [`Session::get_command_output`]: crate::Session::get_command_output

use std::borrow::Cow;
use std::io::Write;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::{read_frame, write_input_reply, write_run_request, Channel, ChannelClass};
use crate::{CommandError, Error, Result};

/// Byte sinks for the server's data channels.
///
/// Each slot receives the full payload of every frame on its channel, in
/// receive order. Channels without a sink are discarded. The sinks are only
/// touched for the duration of a single command.
#[derive(Default)]
pub struct OutputSinks<'a> {
    /// Sink for the output channel (`o`).
    pub output: Option<&'a mut (dyn Write + Send)>,
    /// Sink for the error channel (`e`).
    pub error: Option<&'a mut (dyn Write + Send)>,
    /// Sink for the debug channel (`d`).
    pub debug: Option<&'a mut (dyn Write + Send)>,
}

impl<'a> OutputSinks<'a> {
    /// Sinks that discard everything.
    pub fn none() -> Self {
        Self::default()
    }
}

/// A callable answering one input prompt: given the server's reply cap,
/// produce the reply bytes. Returning an empty reply signals EOF for the
/// prompt.
pub type InputProvider<'a> = &'a mut (dyn FnMut(u32) -> std::io::Result<Vec<u8>> + Send);

/// Input providers for the server's prompt channels.
///
/// Providers run inline on the driver's task and must not call back into
/// the same session. A channel without a provider is answered with the
/// empty (EOF) reply so the server never stalls waiting on the client.
#[derive(Default)]
pub struct InputProviders<'a> {
    /// Provider for line prompts (`L`). Replies should end with a newline.
    pub line: Option<InputProvider<'a>>,
    /// Provider for byte prompts (`I`).
    pub bytes: Option<InputProvider<'a>>,
}

impl<'a> InputProviders<'a> {
    /// Providers that answer every prompt with EOF.
    pub fn none() -> Self {
        Self::default()
    }
}

/// The captured output of one command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Raw bytes captured from the output channel.
    pub stdout: Vec<u8>,
    /// Raw bytes captured from the error channel.
    pub stderr: Vec<u8>,
    /// The command's exit code.
    pub exit_code: i32,
    /// The session's negotiated encoding at capture time.
    pub encoding: String,
}

impl CommandResult {
    /// The captured stdout as text, decoded per the session's negotiated
    /// encoding.
    ///
    /// UTF-8-family encodings (`UTF-8`, `ascii`) are decoded strictly;
    /// invalid bytes fail with [`Error::Decode`]. Other encodings fall
    /// back to lossy UTF-8, since the crate carries no transcoding tables;
    /// the raw bytes stay available in [`stdout`](Self::stdout) for
    /// callers that need an exact conversion.
    pub fn stdout_text(&self) -> Result<Cow<'_, str>> {
        decode_output(&self.stdout, &self.encoding)
    }

    /// The captured stderr as text. Same decoding rules as
    /// [`stdout_text`](Self::stdout_text).
    pub fn stderr_text(&self) -> Result<Cow<'_, str>> {
        decode_output(&self.stderr, &self.encoding)
    }

    /// Whether the command exited with code zero.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a non-matching exit code into a [`CommandError`].
    ///
    /// Exit-code interpretation is deliberately the caller's decision; the
    /// driver itself never treats a non-zero code as a failure.
    pub fn checked(self, expected: i32, message: impl Into<String>) -> Result<Self> {
        if self.exit_code == expected {
            Ok(self)
        } else {
            Err(CommandError::new(message, self).into())
        }
    }
}

/// Whether a negotiated encoding name means the output is UTF-8 on the
/// wire (ASCII being the trivial subset).
fn is_utf8_family(encoding: &str) -> bool {
    matches!(
        encoding.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "ascii" | "us-ascii"
    )
}

/// Decode captured output per the negotiated encoding: strict for the
/// UTF-8 family, lossy otherwise.
fn decode_output<'a>(bytes: &'a [u8], encoding: &str) -> Result<Cow<'a, str>> {
    if is_utf8_family(encoding) {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Cow::Borrowed(text)),
            Err(source) => Err(Error::Decode {
                encoding: encoding.to_string(),
                source,
            }),
        }
    } else {
        Ok(String::from_utf8_lossy(bytes))
    }
}

/// Run one command over the given transport.
///
/// Writes the framed `runcommand` request for `argv`, then dispatches
/// inbound frames until the result frame arrives:
///
/// - data frames go to the matching sink (or are discarded),
/// - prompt frames invoke the matching provider and frame its reply back,
///   truncated to the server's advertised cap,
/// - the result frame's signed 32-bit exit code is returned.
///
/// Exactly one result frame terminates each invocation. End of stream
/// before it is a protocol error, as is any unknown channel byte.
pub async fn run_command<R, W, S>(
    reader: &mut R,
    writer: &mut W,
    argv: &[S],
    sinks: &mut OutputSinks<'_>,
    providers: &mut InputProviders<'_>,
) -> Result<i32>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    if argv.is_empty() {
        return Err(Error::InvalidArgument("argv must not be empty".into()));
    }

    write_run_request(writer, argv).await?;

    loop {
        let frame = read_frame(reader)
            .await?
            .ok_or_else(|| Error::protocol("server terminated early"))?;

        match frame.channel.class() {
            ChannelClass::Result => {
                let code = frame.exit_code()?;
                tracing::debug!(exit_code = code, "command complete");
                return Ok(code);
            }
            ChannelClass::Data => {
                let sink = match frame.channel {
                    Channel::Output => sinks.output.as_deref_mut(),
                    Channel::Error => sinks.error.as_deref_mut(),
                    Channel::Debug => sinks.debug.as_deref_mut(),
                    _ => None,
                };
                if let Some(sink) = sink {
                    sink.write_all(&frame.payload).map_err(Error::io)?;
                }
            }
            ChannelClass::Prompt => {
                let cap = frame
                    .prompt_cap()
                    .ok_or_else(|| Error::protocol("prompt frame without a reply cap"))?;
                let provider = match frame.channel {
                    Channel::LineInput => providers.line.as_deref_mut(),
                    Channel::ByteInput => providers.bytes.as_deref_mut(),
                    _ => None,
                };
                let mut reply = match provider {
                    Some(provider) => provider(cap).map_err(Error::io)?,
                    None => Vec::new(),
                };
                if reply.len() > cap as usize {
                    reply.truncate(cap as usize);
                }
                write_input_reply(writer, &reply).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(channel: u8, payload: &[u8]) -> Vec<u8> {
        let mut wire = vec![channel];
        wire.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        wire.extend_from_slice(payload);
        wire
    }

    fn prompt(channel: u8, cap: u32) -> Vec<u8> {
        let mut wire = vec![channel];
        wire.extend_from_slice(&cap.to_be_bytes());
        wire
    }

    fn result(code: i32) -> Vec<u8> {
        frame(b'r', &code.to_be_bytes())
    }

    #[tokio::test]
    async fn empty_argv_writes_nothing() {
        let mut reader: &[u8] = &[];
        let mut writer = Vec::new();
        let err = run_command(
            &mut reader,
            &mut writer,
            &[] as &[&str],
            &mut OutputSinks::none(),
            &mut InputProviders::none(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(writer.is_empty());
    }

    #[tokio::test]
    async fn output_routed_to_sink_in_order() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&frame(b'o', b"first "));
        wire.extend_from_slice(&frame(b'e', b"stderr noise"));
        wire.extend_from_slice(&frame(b'o', b"second"));
        wire.extend_from_slice(&result(0));

        let mut stdout = Vec::new();
        let mut sinks = OutputSinks {
            output: Some(&mut stdout),
            ..Default::default()
        };

        let mut reader: &[u8] = &wire;
        let mut writer = Vec::new();
        let code = run_command(
            &mut reader,
            &mut writer,
            &["status"],
            &mut sinks,
            &mut InputProviders::none(),
        )
        .await
        .unwrap();

        assert_eq!(code, 0);
        // Sink sees the concatenation of output payloads in receive order;
        // the error channel had no sink and was discarded.
        assert_eq!(stdout, b"first second");
    }

    #[tokio::test]
    async fn prompt_reply_is_framed_and_truncated() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&prompt(b'L', 4));
        wire.extend_from_slice(&result(0));

        let mut provider = |cap: u32| -> std::io::Result<Vec<u8>> {
            assert_eq!(cap, 4);
            Ok(b"yes please\n".to_vec())
        };
        let mut providers = InputProviders {
            line: Some(&mut provider),
            ..Default::default()
        };

        let mut reader: &[u8] = &wire;
        let mut writer = Vec::new();
        run_command(
            &mut reader,
            &mut writer,
            &["merge"],
            &mut OutputSinks::none(),
            &mut providers,
        )
        .await
        .unwrap();

        // Request first, then the reply truncated to the 4-byte cap.
        let reply_at = writer.len() - 8;
        assert_eq!(&writer[reply_at..reply_at + 4], &4u32.to_be_bytes());
        assert_eq!(&writer[reply_at + 4..], b"yes ");
    }

    #[tokio::test]
    async fn missing_provider_answers_eof() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&prompt(b'I', 4096));
        wire.extend_from_slice(&result(0));

        let mut reader: &[u8] = &wire;
        let mut writer = Vec::new();
        run_command(
            &mut reader,
            &mut writer,
            &["import", "-"],
            &mut OutputSinks::none(),
            &mut InputProviders::none(),
        )
        .await
        .unwrap();

        assert_eq!(&writer[writer.len() - 4..], &0u32.to_be_bytes());
    }

    #[tokio::test]
    async fn early_eof_is_protocol_error() {
        let wire = frame(b'o', b"partial output, no result");
        let mut reader: &[u8] = &wire;
        let mut writer = Vec::new();
        let err = run_command(
            &mut reader,
            &mut writer,
            &["log"],
            &mut OutputSinks::none(),
            &mut InputProviders::none(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg.contains("terminated early")));
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&prompt(b'L', 8));
        wire.extend_from_slice(&result(0));

        let mut provider = |_cap: u32| -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "caller input failed",
            ))
        };
        let mut providers = InputProviders {
            line: Some(&mut provider),
            ..Default::default()
        };

        let mut reader: &[u8] = &wire;
        let mut writer = Vec::new();
        let err = run_command(
            &mut reader,
            &mut writer,
            &["merge"],
            &mut OutputSinks::none(),
            &mut providers,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn negative_exit_code_survives() {
        let wire = result(-1);
        let mut reader: &[u8] = &wire;
        let mut writer = Vec::new();
        let code = run_command(
            &mut reader,
            &mut writer,
            &["version"],
            &mut OutputSinks::none(),
            &mut InputProviders::none(),
        )
        .await
        .unwrap();
        assert_eq!(code, -1);
    }

    #[test]
    fn command_result_text_and_check() {
        let result = CommandResult {
            stdout: b"/tmp/repo\n".to_vec(),
            stderr: Vec::new(),
            exit_code: 0,
            encoding: "UTF-8".to_string(),
        };
        assert_eq!(result.stdout_text().unwrap(), "/tmp/repo\n");
        assert!(result.succeeded());
        assert!(result.clone().checked(0, "root failed").is_ok());

        let failed = CommandResult {
            exit_code: 255,
            ..result
        };
        let err = failed.checked(0, "root failed").unwrap_err();
        match err {
            Error::Command(command_error) => {
                assert_eq!(command_error.result.exit_code, 255);
                assert!(command_error.to_string().contains("root failed"));
            }
            other => panic!("expected CommandError, got {other:?}"),
        }
    }

    #[test]
    fn utf8_family_decodes_strictly() {
        let result = CommandResult {
            stdout: "päth\n".as_bytes().to_vec(),
            stderr: Vec::new(),
            exit_code: 0,
            encoding: "UTF-8".to_string(),
        };
        assert_eq!(result.stdout_text().unwrap(), "päth\n");

        // Family membership is case-insensitive and includes ASCII.
        for encoding in ["utf-8", "utf8", "ascii", "US-ASCII"] {
            let result = CommandResult {
                encoding: encoding.to_string(),
                ..result.clone()
            };
            assert!(result.stdout_text().is_ok(), "encoding {encoding}");
        }
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let result = CommandResult {
            stdout: vec![0xFF, b'o', b'k'],
            stderr: vec![0xFE],
            exit_code: 0,
            encoding: "UTF-8".to_string(),
        };
        assert!(matches!(
            result.stdout_text(),
            Err(Error::Decode { ref encoding, .. }) if encoding == "UTF-8"
        ));
        assert!(matches!(result.stderr_text(), Err(Error::Decode { .. })));
    }

    #[test]
    fn non_utf8_encodings_decode_lossily() {
        // latin-1 bytes are not transcoded; undecodable sequences are
        // replaced rather than failing.
        let result = CommandResult {
            stdout: vec![0xFF, b'o', b'k'],
            stderr: Vec::new(),
            exit_code: 0,
            encoding: "latin-1".to_string(),
        };
        assert!(result.stdout_text().unwrap().contains("ok"));
    }
}
