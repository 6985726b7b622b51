//! In-process dispatch bus with synchronous, ordered fan-out.
//!
//! Every subscriber attached when an event is dispatched is invoked, in
//! subscription order, before [`DispatchBus::dispatch`] returns. Nothing is
//! queued: with no subscribers the event is dropped.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use homemirror_domain::error::SubscriberError;
use homemirror_domain::event::MirrorEvent;

use crate::ports::Subscriber;

struct Entry {
    id: u64,
    subscriber: Arc<dyn Subscriber>,
}

type Entries = Mutex<Vec<Entry>>;

/// Synchronous publish/subscribe bus for [`MirrorEvent`]s.
///
/// A failing or panicking subscriber is isolated: the fault is logged and
/// returned in the [`DispatchReport`], and dispatch continues.
pub struct DispatchBus {
    entries: Arc<Entries>,
    next_id: AtomicU64,
}

impl Default for DispatchBus {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl DispatchBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber.
    ///
    /// The subscriber stays attached for as long as the returned
    /// [`Subscription`] lives.
    #[must_use = "dropping the subscription detaches the subscriber immediately"]
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(subscriber = subscriber.name(), id, "subscriber attached");
        lock(&self.entries).push(Entry { id, subscriber });
        Subscription {
            id,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Number of attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Deliver `event` to every attached subscriber, in subscription order.
    pub fn dispatch(&self, event: &MirrorEvent) -> DispatchReport {
        // Copy the list so subscribers may detach while being called.
        let targets: Vec<Arc<dyn Subscriber>> = lock(&self.entries)
            .iter()
            .map(|entry| Arc::clone(&entry.subscriber))
            .collect();

        let mut report = DispatchReport::default();
        for subscriber in targets {
            match deliver(subscriber.as_ref(), event) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        subscriber = subscriber.name(),
                        event = event.kind(),
                        error = %err,
                        "subscriber failed, continuing dispatch"
                    );
                    report.failures.push(err);
                }
            }
        }
        report
    }
}

fn deliver(subscriber: &dyn Subscriber, event: &MirrorEvent) -> Result<(), SubscriberError> {
    match catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(SubscriberError::Panicked {
                subscriber: subscriber.name().to_string(),
                message,
            })
        }
    }
}

fn lock(entries: &Entries) -> MutexGuard<'_, Vec<Entry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of a single dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Subscribers that handled the event successfully.
    pub delivered: usize,
    /// Faults raised by the others, in subscription order.
    pub failures: Vec<SubscriberError>,
}

impl DispatchReport {
    /// Whether every subscriber handled the event.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Handle that keeps a subscriber attached; dropping it detaches.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    entries: Weak<Entries>,
}

impl Subscription {
    /// Detach now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            lock(&entries).retain(|entry| entry.id != self.id);
            tracing::debug!(id = self.id, "subscriber detached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homemirror_domain::change::Changes;
    use homemirror_domain::device::Device;

    struct Recorder {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Subscriber for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_event(&self, event: &MirrorEvent) -> Result<(), SubscriberError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, event.kind()));
            Ok(())
        }
    }

    struct Failing;

    impl Subscriber for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_event(&self, _event: &MirrorEvent) -> Result<(), SubscriberError> {
            Err(SubscriberError::failed("failing", "target unavailable"))
        }
    }

    struct Panicking;

    impl Subscriber for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn on_event(&self, _event: &MirrorEvent) -> Result<(), SubscriberError> {
            panic!("boom");
        }
    }

    fn recorder(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Subscriber> {
        Arc::new(Recorder {
            name: name.to_string(),
            log: Arc::clone(log),
        })
    }

    fn updated() -> MirrorEvent {
        let device = Device::builder().id("d1").name("Lamp").build().unwrap();
        MirrorEvent::updated(device, Changes::ALL)
    }

    #[test]
    fn should_deliver_in_subscription_order() {
        let bus = DispatchBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = bus.subscribe(recorder("a", &log));
        let _b = bus.subscribe(recorder("b", &log));

        let report = bus.dispatch(&updated());

        assert_eq!(report.delivered, 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:device_updated".to_string(), "b:device_updated".to_string()]
        );
    }

    #[test]
    fn should_drop_event_silently_without_subscribers() {
        let bus = DispatchBus::new();
        let report = bus.dispatch(&MirrorEvent::loaded(Vec::new()));
        assert_eq!(report.delivered, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn should_detach_when_subscription_dropped() {
        let bus = DispatchBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sub = bus.subscribe(recorder("a", &log));
        assert_eq!(bus.subscriber_count(), 1);

        sub.unsubscribe();
        bus.dispatch(&updated());

        assert_eq!(bus.subscriber_count(), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn should_keep_dispatching_after_subscriber_error() {
        let bus = DispatchBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _f = bus.subscribe(Arc::new(Failing));
        let _a = bus.subscribe(recorder("a", &log));

        let report = bus.dispatch(&updated());

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn should_isolate_panicking_subscriber() {
        let bus = DispatchBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _p = bus.subscribe(Arc::new(Panicking));
        let _a = bus.subscribe(recorder("a", &log));

        let report = bus.dispatch(&updated());

        assert_eq!(report.delivered, 1);
        assert!(matches!(
            &report.failures[0],
            SubscriberError::Panicked { subscriber, message }
                if subscriber == "panicking" && message == "boom"
        ));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn should_not_fail_when_subscription_outlives_bus() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sub = {
            let bus = DispatchBus::new();
            bus.subscribe(recorder("a", &log))
        };
        drop(sub);
    }
}
