//! Subscriber port: consumers of the dispatch bus.

use homemirror_domain::error::SubscriberError;
use homemirror_domain::event::MirrorEvent;

/// A consumer of mirror events.
///
/// Subscribers receive immutable views of device records and keep whatever
/// local state they need behind their own interior mutability. They must be
/// idempotent: the same change may be delivered again after a reconnect.
///
/// A subscriber must not call back into the mirror that is dispatching to it.
pub trait Subscriber: Send + Sync {
    /// Name used in logs and fault reports.
    fn name(&self) -> &str;

    /// React to a single event.
    ///
    /// # Errors
    ///
    /// Returns a [`SubscriberError`] when the reaction failed. The bus logs it
    /// and keeps dispatching to the remaining subscribers.
    fn on_event(&self, event: &MirrorEvent) -> Result<(), SubscriberError>;
}
