//! Frame codec for the command-server wire protocol.
//!
//! Every inbound frame starts with a 5-byte header: one ASCII channel byte
//! followed by an unsigned 32-bit length in network byte order. For data and
//! result channels the length counts payload bytes that follow; for prompt
//! channels it is the maximum reply size and no payload follows.
//!
//! All length fields on the wire are big-endian, in both directions. Host
//! byte order never appears in this module.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::channel::{Channel, ChannelClass};
use crate::{Error, Result};

/// Size of the frame header: channel byte + u32 length.
pub const HEADER_SIZE: usize = 5;

/// The request introducer for command submissions.
pub(crate) const RUN_COMMAND: &[u8] = b"runcommand\n";

/// One header + optional payload unit of the protocol.
///
/// For prompt channels (`L`/`I`) the payload is exactly the four big-endian
/// header length bytes; use [`Frame::prompt_cap`] to decode them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The channel this frame belongs to.
    pub channel: Channel,
    /// The frame payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(channel: Channel, payload: impl Into<Bytes>) -> Self {
        Self {
            channel,
            payload: payload.into(),
        }
    }

    /// The maximum reply size advertised by a prompt frame.
    ///
    /// Returns `None` for non-prompt channels.
    pub fn prompt_cap(&self) -> Option<u32> {
        if !self.channel.is_prompt() {
            return None;
        }
        let bytes: [u8; 4] = self.payload.as_ref().try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// Decode the exit code carried by a result frame.
    ///
    /// The result payload must be exactly four bytes, a signed 32-bit
    /// integer in network byte order.
    pub fn exit_code(&self) -> Result<i32> {
        let bytes: [u8; 4] = self.payload.as_ref().try_into().map_err(|_| {
            Error::protocol(format!(
                "result frame payload must be 4 bytes, got {}",
                self.payload.len()
            ))
        })?;
        Ok(i32::from_be_bytes(bytes))
    }
}

/// Read one frame from the server stream.
///
/// Returns `Ok(None)` on a clean end of stream (EOF before any header byte).
/// A partial header, an unknown channel byte, or a truncated payload is a
/// protocol error. Payload lengths are handled as unsigned 32-bit values; a
/// single logical read may span multiple OS-level reads.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    let mut filled = 0;
    while filled < HEADER_SIZE {
        let n = reader
            .read(&mut header[filled..])
            .await
            .map_err(Error::io)?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(Error::protocol("malformed header"));
        }
        filled += n;
    }

    let channel = Channel::from_byte(header[0]).ok_or_else(|| {
        Error::protocol(format!("invalid channel byte {:#04x}", header[0]))
    })?;
    let length = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

    tracing::trace!(channel = %channel, length, "frame header");

    // Prompt frames carry no payload; the length field is the reply cap and
    // is preserved verbatim for the caller.
    if channel.class() == ChannelClass::Prompt {
        return Ok(Some(Frame::new(channel, header[1..HEADER_SIZE].to_vec())));
    }

    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::protocol(format!(
                "truncated payload on channel {channel}: expected {length} bytes"
            ))
        } else {
            Error::io(err)
        }
    })?;

    Ok(Some(Frame::new(channel, payload)))
}

/// Encode an argument vector into the NUL-separated block of a
/// `runcommand` request.
///
/// Arguments are UTF-8 bytes joined by single NUL bytes, with no trailing
/// NUL after the last argument.
pub fn encode_argv<S: AsRef<str>>(argv: &[S]) -> Vec<u8> {
    let total: usize =
        argv.iter().map(|a| a.as_ref().len()).sum::<usize>() + argv.len().saturating_sub(1);
    let mut block = Vec::with_capacity(total);
    for (i, arg) in argv.iter().enumerate() {
        if i > 0 {
            block.push(0);
        }
        block.extend_from_slice(arg.as_ref().as_bytes());
    }
    block
}

/// Write a `runcommand` request to the server's stdin.
///
/// Wire layout: the literal bytes `runcommand\n`, a big-endian u32 giving the
/// length of the argument block, then the block itself. The stream is
/// flushed so the server sees the complete request.
pub async fn write_run_request<W, S>(writer: &mut W, argv: &[S]) -> Result<()>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    let block = encode_argv(argv);
    let length = u32::try_from(block.len())
        .map_err(|_| Error::InvalidArgument("argument block exceeds u32 length".into()))?;

    writer.write_all(RUN_COMMAND).await.map_err(Error::io)?;
    writer
        .write_all(&length.to_be_bytes())
        .await
        .map_err(Error::io)?;
    writer.write_all(&block).await.map_err(Error::io)?;
    writer.flush().await.map_err(Error::io)?;
    Ok(())
}

/// Write an input reply to the server's stdin.
///
/// Wire layout: a big-endian u32 reply length followed by the reply bytes.
/// An empty reply signals EOF for the prompt.
pub async fn write_input_reply<W>(writer: &mut W, reply: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let length = u32::try_from(reply.len())
        .map_err(|_| Error::InvalidArgument("input reply exceeds u32 length".into()))?;
    writer
        .write_all(&length.to_be_bytes())
        .await
        .map_err(Error::io)?;
    writer.write_all(reply).await.map_err(Error::io)?;
    writer.flush().await.map_err(Error::io)?;
    Ok(())
}
