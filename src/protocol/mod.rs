//! Wire protocol for the Mercurial command server.
//!
//! The server multiplexes logical streams over its stdout as framed,
//! channel-tagged messages and accepts framed requests and input replies on
//! its stdin. This module implements the codec layer:
//!
//! - [`Channel`] / [`ChannelClass`]: the channel byte table and its policy
//! - [`Frame`] / [`read_frame`]: inbound frame decoding
//! - [`write_run_request`] / [`write_input_reply`]: outbound encoding
//! - [`ServerHello`]: the handshake frame the server emits on startup
//!
//! # Wire format
//!
//! ```text
//! server -> client   ┌─────────┬──────────────┬─────────────────┐
//!                    │ channel │ length       │ payload          │
//!                    │ 1 byte  │ u32 BE       │ length bytes     │
//!                    │ o e r d │              │ (none for L, I)  │
//!                    └─────────┴──────────────┴─────────────────┘
//! client -> server   "runcommand\n" · u32be(L) · NUL-joined argv
//!                    u32be(k) · k reply bytes         (input replies)
//! ```

mod channel;
mod frame;
mod hello;

pub use channel::{Channel, ChannelClass};
pub use frame::{encode_argv, read_frame, write_input_reply, write_run_request, Frame, HEADER_SIZE};
pub use hello::ServerHello;
