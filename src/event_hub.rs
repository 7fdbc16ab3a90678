//! Multicast event distribution for the editor's change streams.
//!
//! [`EventHub`] is the single pub-sub primitive used by the graph store,
//! the layout mirror, and the grouping subsystem. Each subscriber gets its
//! own unbounded [`flume`] receiver; publishing clones the event into every
//! live receiver and prunes subscribers whose receiving end was dropped.
//!
//! Subscription is strictly future-only: a new subscriber observes events
//! emitted after it subscribed, never history. This matches the engine's
//! cooperative single-threaded model, where subsystems drain their queues
//! when the session pumps them after each mutation.

/// A multicast sender with future-only subscription semantics.
///
/// # Examples
///
/// ```
/// use flowboard::event_hub::EventHub;
///
/// let mut hub: EventHub<u32> = EventHub::new();
/// hub.emit(1); // no subscribers yet, dropped
///
/// let rx = hub.subscribe();
/// hub.emit(2);
/// hub.emit(3);
/// assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![2, 3]);
/// ```
#[derive(Debug)]
pub struct EventHub<E> {
    senders: Vec<flume::Sender<E>>,
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventHub<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Registers a new subscriber and returns its receiving end.
    ///
    /// The receiver only observes events emitted after this call.
    pub fn subscribe(&mut self) -> flume::Receiver<E> {
        let (tx, rx) = flume::unbounded();
        self.senders.push(tx);
        rx
    }

    /// Number of live subscribers (including ones whose disconnection has
    /// not been noticed yet).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

impl<E: Clone> EventHub<E> {
    /// Delivers `event` to every live subscriber.
    ///
    /// Subscribers whose receiver was dropped are removed here rather than
    /// at subscription time, so emission is the only place that pays for
    /// cleanup.
    pub fn emit(&mut self, event: E) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_only_see_future_events() {
        let mut hub = EventHub::new();
        hub.emit("early");
        let rx = hub.subscribe();
        hub.emit("late");
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["late"]);
    }

    #[test]
    fn emit_reaches_every_subscriber() {
        let mut hub = EventHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        hub.emit(7u8);
        assert_eq!(a.try_iter().collect::<Vec<_>>(), vec![7]);
        assert_eq!(b.try_iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_emit() {
        let mut hub = EventHub::new();
        let rx = hub.subscribe();
        drop(rx);
        let _live = hub.subscribe();
        hub.emit(1u8);
        assert_eq!(hub.subscriber_count(), 1);
    }
}
