//! Channel tags multiplexed over the command server's stdout.
//!
//! Each inbound frame is tagged with a single ASCII byte identifying the
//! logical stream it belongs to. This module is the single source of truth
//! for channel semantics: both the frame decoder (unknown byte is a hard
//! protocol error) and the command driver (dispatch) consult it. Adding a
//! channel means touching only this table.

/// A logical stream multiplexed over the child's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Command output (`o`).
    Output,
    /// Command error output (`e`).
    Error,
    /// Terminal frame carrying the command's exit code (`r`).
    Result,
    /// Debug output (`d`).
    Debug,
    /// The server solicits a line of input; the length field is the reply cap (`L`).
    LineInput,
    /// The server solicits raw bytes; the length field is the reply cap (`I`).
    ByteInput,
}

/// Semantic class of a channel, driving both decode and dispatch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelClass {
    /// The length field counts payload bytes that follow; payload is routed
    /// to an output sink (or discarded).
    Data,
    /// The length field is the maximum reply size; no payload follows.
    Prompt,
    /// The length field counts payload bytes; the payload is the exit code
    /// and terminates the command.
    Result,
}

impl Channel {
    /// Map a wire byte to its channel, or `None` for an unknown byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'o' => Some(Channel::Output),
            b'e' => Some(Channel::Error),
            b'r' => Some(Channel::Result),
            b'd' => Some(Channel::Debug),
            b'L' => Some(Channel::LineInput),
            b'I' => Some(Channel::ByteInput),
            _ => None,
        }
    }

    /// The wire byte for this channel.
    pub fn as_byte(self) -> u8 {
        match self {
            Channel::Output => b'o',
            Channel::Error => b'e',
            Channel::Result => b'r',
            Channel::Debug => b'd',
            Channel::LineInput => b'L',
            Channel::ByteInput => b'I',
        }
    }

    /// The semantic class of this channel.
    pub fn class(self) -> ChannelClass {
        match self {
            Channel::Output | Channel::Error | Channel::Debug => ChannelClass::Data,
            Channel::LineInput | Channel::ByteInput => ChannelClass::Prompt,
            Channel::Result => ChannelClass::Result,
        }
    }

    /// Whether this channel solicits input from the client.
    pub fn is_prompt(self) -> bool {
        self.class() == ChannelClass::Prompt
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}
