//! Command sink port: hands outbound requests to the session collaborator.

use homemirror_domain::command::Command;
use homemirror_domain::error::MirrorError;

/// Accepts fire-and-forget commands destined for the remote session.
///
/// Implementations must not block; the mirror does not wait for an
/// acknowledgement and relies on a later update to confirm the effect.
pub trait CommandSink: Send + Sync {
    /// Queue a command for sending.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Transport`] when the session cannot accept it.
    fn send(&self, command: Command) -> Result<(), MirrorError>;
}

impl<T: CommandSink + ?Sized> CommandSink for std::sync::Arc<T> {
    fn send(&self, command: Command) -> Result<(), MirrorError> {
        (**self).send(command)
    }
}
