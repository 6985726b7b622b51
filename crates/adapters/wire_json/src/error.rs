//! Wire adapter error types.

use homemirror_domain::error::MirrorError;

/// Errors specific to the wire adapter.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The line was not valid JSON, or did not have the expected shape.
    #[error("malformed wire message")]
    Malformed(#[source] serde_json::Error),

    /// A message was missing a field it cannot do without.
    #[error("`{action}` message is missing `{field}`")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    /// A device arrived without an `id`.
    #[error("device without id")]
    MissingId,

    /// The outbound channel has been closed by the session writer.
    #[error("outbound channel closed")]
    ChannelClosed,

    /// The mirror rejected what the session delivered.
    #[error("mirror error")]
    Mirror(#[source] MirrorError),
}

impl WireError {
    /// Convert into a [`MirrorError::Transport`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> MirrorError {
        match self {
            Self::Mirror(err) => err,
            other => MirrorError::Transport(Box::new(other)),
        }
    }
}

impl From<WireError> for MirrorError {
    fn from(err: WireError) -> Self {
        err.into_domain()
    }
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err)
    }
}

impl From<MirrorError> for WireError {
    fn from(err: MirrorError) -> Self {
        Self::Mirror(err)
    }
}
