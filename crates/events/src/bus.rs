//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes cart events to whoever renders them (badge counters,
//! "added to cart" toasts, the demo log). It is transport-agnostic and does no
//! storage: carts live in memory and events are notifications, not a record.

use std::sync::mpsc::{Receiver, TryRecvError};

/// A subscription to an event stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics), in publication order. Views poll it between
/// renders; nothing blocks.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Next queued message, if any.
    pub fn try_recv(&self) -> Option<M> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drain every message that is already queued.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish()` can fail; failures are surfaced to the caller (the session
/// registry), which reports them without rolling back the cart change.
pub trait EventBus<M>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}
