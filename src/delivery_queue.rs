//! # Delivery Queue
//!
//! Bounded FIFO between the receive completion context (producer) and the polled
//! application loop (consumer). Both ends are non-blocking: `enqueue` never waits
//! and drops the newest message when all slots are taken, `try_dequeue` returns
//! `None` when the queue is empty. There is no backpressure signal to the producer.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{Level, log};

use crate::DELIVERY_QUEUE_SIZE;
use crate::messages::{QueueMessageKind, QueuedMessage};

/// Interrupt-safe FIFO of [`QueuedMessage`]s, `DELIVERY_QUEUE_SIZE` slots
pub struct DeliveryQueue {
    channel: Channel<CriticalSectionRawMutex, QueuedMessage, DELIVERY_QUEUE_SIZE>,
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryQueue {
    /// Creates an empty queue, usable in a `static`
    pub const fn new() -> Self {
        DeliveryQueue { channel: Channel::new() }
    }

    /// Queues a copy of `payload`, truncated to one slot
    ///
    /// Safe to call from completion context. Returns `false` if the message was
    /// dropped because the queue is full; callers on the interrupt side ignore it.
    pub fn enqueue(&self, kind: QueueMessageKind, payload: &[u8]) -> bool {
        match self.channel.try_send(QueuedMessage::new(kind, payload)) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                log!(
                    Level::Warn,
                    "Delivery queue full, dropping message. kind: {:?}, size: {}",
                    dropped.kind(),
                    dropped.frame_length()
                );
                false
            }
        }
    }

    /// Takes the oldest message
    ///
    /// # Returns
    /// `Some(message)` in arrival order, `None` when the queue is empty. Never blocks.
    pub fn try_dequeue(&self) -> Option<QueuedMessage> {
        self.channel.try_receive().ok()
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Discards every queued message
    pub fn clear(&self) {
        self.channel.clear();
    }
}
