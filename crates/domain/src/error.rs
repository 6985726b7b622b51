//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`MirrorError`]
//! via `#[from]` when crossing a port boundary.

/// Top-level error for the mirror engine and its ports.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// An operation that requires a loaded registry was called before the
    /// first snapshot arrived.
    #[error("registry has not received a snapshot yet")]
    NotLoaded,

    /// Incoming data violated a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A subscriber failed while handling an event.
    #[error("subscriber error")]
    Subscriber(#[from] SubscriberError),

    /// An adapter failed to deliver or decode a message.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A device arrived without an identifier.
    #[error("device id must not be empty")]
    EmptyId,

    /// A binding was declared without a target name.
    #[error("binding name must not be empty")]
    EmptyBindingName,

    /// A capability keyword was not recognised.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
}

/// Failure reported by a subscriber while reacting to an event.
///
/// Never aborts dispatch: the bus logs it and moves on to the next
/// subscriber.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    /// The subscriber panicked; the payload message is captured when it is a string.
    #[error("subscriber `{subscriber}` panicked: {message}")]
    Panicked {
        subscriber: String,
        message: String,
    },

    /// The subscriber returned an error of its own.
    #[error("subscriber `{subscriber}` failed")]
    Failed {
        subscriber: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SubscriberError {
    /// Wrap an arbitrary error raised by the named subscriber.
    pub fn failed(
        subscriber: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Failed {
            subscriber: subscriber.into(),
            source: source.into(),
        }
    }
}
