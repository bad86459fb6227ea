//! Fan-out of protocol events to subscribers
//!
//! Every subscriber owns a bounded crossbeam queue. Events are handed to
//! subscribers in registration order, and each subscriber sees events in
//! the order they were published.
//!
//! # Backpressure
//!
//! The policy is chosen per bus:
//!
//! - [`Backpressure::Block`] - the producer waits for room in a full queue.
//!   A subscriber that stops reading stalls every subscriber registered
//!   after it, and stalls the serial dispatcher that feeds the bus. The
//!   wait is cut short when the caller's stop signal fires.
//! - [`Backpressure::DropOldest`] - a full queue discards its oldest event
//!   to make room. The producer never waits.
//!
//! Subscribers on a blocking bus that drop their receiver are pruned on the
//! next publish. A drop-oldest bus holds a receiver of its own for every
//! queue, so its subscribers leave through [`EventBus::unsubscribe`].

use crossbeam_channel::{bounded, never, select, Receiver, Sender, TrySendError};
use std::sync::{Mutex, PoisonError};

/// Default per-subscriber queue capacity
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

/// What to do when a subscriber's queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backpressure {
    /// Wait until the subscriber makes room
    #[default]
    Block,
    /// Evict the oldest queued event.
    ///
    /// The bus keeps a receiver for eviction, so dropping the subscriber's
    /// receiver does not end the subscription; call
    /// [`EventBus::unsubscribe`] instead.
    DropOldest,
}

/// Outcome of a publish call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Every event reached every live subscriber
    Complete,
    /// The stop signal fired while waiting on a full queue
    Interrupted,
}

struct Subscriber<T> {
    sender: Sender<T>,
    /// Receiver clone used to evict under `DropOldest`
    evict: Option<Receiver<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            evict: self.evict.clone(),
        }
    }
}

/// Registry of subscriber queues for one event type
pub struct EventBus<T> {
    subscribers: Mutex<Vec<Subscriber<T>>>,
    capacity: usize,
    policy: Backpressure,
}

impl<T: Clone + Send> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY, Backpressure::default())
    }
}

impl<T: Clone + Send> EventBus<T> {
    /// Create a bus with the given per-subscriber capacity and policy
    pub fn new(capacity: usize, policy: Backpressure) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
            policy,
        }
    }

    pub fn policy(&self) -> Backpressure {
        self.policy
    }

    /// Register a new subscriber queue
    pub fn subscribe(&self) -> Receiver<T> {
        let (sender, receiver) = bounded(self.capacity);
        let evict = match self.policy {
            Backpressure::Block => None,
            Backpressure::DropOldest => Some(receiver.clone()),
        };

        self.lock().push(Subscriber { sender, evict });
        receiver
    }

    /// Remove the subscription `receiver` was handed out for.
    ///
    /// Returns false if it is not registered. Only drop-oldest
    /// subscriptions are matched; a blocking subscription ends when its
    /// receiver is dropped.
    pub fn unsubscribe(&self, receiver: &Receiver<T>) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|s| match &s.evict {
            Some(evict) => !evict.same_channel(receiver),
            None => true,
        });
        before != subscribers.len()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver events to every subscriber, never giving up on a full queue
    pub fn publish(&self, events: &[T]) -> Delivery {
        self.publish_until(events, &never())
    }

    /// Deliver events to every subscriber, abandoning blocked hand-offs
    /// once `stop` fires or disconnects
    pub fn publish_until(&self, events: &[T], stop: &Receiver<()>) -> Delivery {
        if events.is_empty() {
            return Delivery::Complete;
        }

        // Deliver from a snapshot so a stalled subscriber does not block `subscribe`
        let subscribers = self.lock().clone();
        let mut dead = Vec::new();

        for (index, subscriber) in subscribers.iter().enumerate() {
            for event in events {
                match self.deliver(subscriber, event.clone(), stop) {
                    Ok(()) => {}
                    Err(DeliverError::Disconnected) => {
                        dead.push(index);
                        break;
                    }
                    Err(DeliverError::Interrupted) => return Delivery::Interrupted,
                }
            }
        }

        if !dead.is_empty() {
            self.prune(&subscribers, &dead);
        }

        Delivery::Complete
    }

    fn deliver(
        &self,
        subscriber: &Subscriber<T>,
        event: T,
        stop: &Receiver<()>,
    ) -> Result<(), DeliverError> {
        match &subscriber.evict {
            None => select! {
                send(subscriber.sender, event) -> res => {
                    res.map_err(|_| DeliverError::Disconnected)
                }
                recv(stop) -> _ => Err(DeliverError::Interrupted),
            },
            Some(evict) => {
                let mut event = event;
                loop {
                    match subscriber.sender.try_send(event) {
                        Ok(()) => return Ok(()),
                        Err(TrySendError::Full(rejected)) => {
                            let _ = evict.try_recv();
                            event = rejected;
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            return Err(DeliverError::Disconnected)
                        }
                    }
                }
            }
        }
    }

    fn prune(&self, snapshot: &[Subscriber<T>], dead: &[usize]) {
        let mut subscribers = self.lock();
        subscribers.retain(|s| {
            !dead
                .iter()
                .any(|&i| snapshot[i].sender.same_channel(&s.sender))
        });
        tracing::debug!("Pruned {} disconnected subscriber(s)", dead.len());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber<T>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum DeliverError {
    Disconnected,
    Interrupted,
}
