//! Channel-backed [`CommandSink`].
//!
//! Encodes each command into a wire line and hands it to whichever task
//! owns the socket writer.

use tokio::sync::mpsc::UnboundedSender;

use homemirror_app::ports::CommandSink;
use homemirror_domain::command::Command;
use homemirror_domain::error::MirrorError;

use crate::codec::encode_command;
use crate::error::WireError;

/// Sends encoded commands down an unbounded channel.
///
/// Never blocks, so it is safe to call while the mirror lock is held.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    /// Create a sink feeding `tx`.
    #[must_use]
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl CommandSink for ChannelSink {
    fn send(&self, command: Command) -> Result<(), MirrorError> {
        let line = encode_command(&command)?;
        self.tx
            .send(line)
            .map_err(|_| WireError::ChannelClosed.into_domain())
    }
}
