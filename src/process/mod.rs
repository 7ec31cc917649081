//! Child-process management for the Mercurial command server.
//!
//! The server is launched once per session as `hg serve --cmdserver pipe`
//! and stays resident; the library owns all three of its standard streams.
//!
//! # Architecture
//!
//! ```text
//! libhg                              hg serve --cmdserver pipe
//! ┌─────────────┐                   ┌─────────────┐
//! │  HgProcess  │──stdin (requests)▶│             │
//! │             │◀─stdout (frames)──│             │
//! │             │◀─stderr (diag)────│             │
//! └─────────────┘                   └─────────────┘
//! ```
//!
//! stdout carries the framed, channel-tagged protocol; stderr is used only
//! to surface launch diagnostics. No terminal is attached.

mod spawn;

pub use spawn::{HgProcess, StderrReader};

use std::time::Duration;

/// How long a shutdown waits for the server to exit after its stdin is
/// closed before escalating to a kill.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HgProcess>();
        assert_send_sync::<StderrReader>();
    }

    #[test]
    fn grace_window_is_reasonable() {
        assert!(SHUTDOWN_GRACE >= Duration::from_secs(1));
        assert!(SHUTDOWN_GRACE <= Duration::from_secs(30));
    }
}
