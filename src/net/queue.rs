//! Bounded hand-off from network threads to the frame loop
//!
//! Network tasks push events through cloned [`QueueSender`]s without
//! blocking; the frame loop drains everything pending once per frame.
//! Ordinary events share a bounded lane and are refused when it is full.
//! Lifecycle events go through an unbounded priority lane, are never
//! refused while the queue lives, and are drained ahead of ordinary ones.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use crate::game::constants::net::EVENT_QUEUE_CAPACITY;

pub struct EventQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    priority_sender: Sender<T>,
    priority_receiver: Receiver<T>,
    capacity: usize,
}

impl<T> EventQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        let (priority_sender, priority_receiver) = unbounded();
        Self {
            sender,
            receiver,
            priority_sender,
            priority_receiver,
            capacity,
        }
    }

    /// Handle for a producer thread
    pub fn sender(&self) -> QueueSender<T> {
        QueueSender {
            sender: self.sender.clone(),
            priority: self.priority_sender.clone(),
        }
    }

    /// Non-blocking push from the owning side. Returns false when full.
    #[inline]
    pub fn try_push(&self, event: T) -> bool {
        self.sender.try_send(event).is_ok()
    }

    /// Take every pending event: priority events first, then ordinary
    /// ones, each lane oldest first
    pub fn drain(&self) -> Vec<T> {
        let mut events: Vec<T> = self.priority_receiver.try_iter().collect();
        events.extend(self.receiver.try_iter());
        events
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.priority_receiver.len() + self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.priority_receiver.is_empty() && self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new(EVENT_QUEUE_CAPACITY)
    }
}

pub struct QueueSender<T> {
    sender: Sender<T>,
    priority: Sender<T>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            priority: self.priority.clone(),
        }
    }
}

impl<T> QueueSender<T> {
    #[inline]
    pub fn try_send(&self, event: T) -> Result<(), QueueError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Disconnected(_) => QueueError::Disconnected,
        })
    }

    /// Push on the priority lane. Only fails once the queue is dropped.
    pub fn send_priority(&self, event: T) -> Result<(), QueueError> {
        self.priority.send(event).map_err(|_| QueueError::Disconnected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Frame loop is not keeping up
    #[error("event queue full")]
    Full,
    /// Frame loop side dropped
    #[error("event queue disconnected")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let queue = EventQueue::new(10);
        let tx = queue.sender();
        tx.try_send(1).unwrap();
        tx.try_send(2).unwrap();
        assert!(queue.try_push(3));
        assert_eq!(queue.pending_count(), 3);

        assert_eq!(queue.drain(), vec![1, 2, 3]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_backpressure_when_full() {
        let queue = EventQueue::new(2);
        let tx = queue.sender();
        assert!(tx.try_send("a").is_ok());
        assert!(tx.try_send("b").is_ok());
        assert_eq!(tx.try_send("c"), Err(QueueError::Full));

        queue.drain();
        assert!(tx.try_send("c").is_ok());
    }

    #[test]
    fn test_senders_from_threads() {
        let queue = EventQueue::new(64);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let tx = queue.sender();
                std::thread::spawn(move || {
                    for i in 0..8 {
                        tx.try_send(t * 100 + i).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let mut got = queue.drain();
        got.sort_unstable();
        assert_eq!(got.len(), 32);
        assert_eq!(got[0], 0);
        assert_eq!(got[31], 307);
    }

    #[test]
    fn test_priority_survives_full_queue() {
        let queue = EventQueue::new(2);
        let tx = queue.sender();
        tx.try_send("input-1").unwrap();
        tx.try_send("input-2").unwrap();
        assert_eq!(tx.try_send("input-3"), Err(QueueError::Full));

        tx.send_priority("left").unwrap();
        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.drain(), vec!["left", "input-1", "input-2"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_disconnected_after_drop() {
        let queue: EventQueue<u8> = EventQueue::default();
        assert_eq!(queue.capacity(), EVENT_QUEUE_CAPACITY);
        let tx = queue.sender();
        drop(queue);
        assert_eq!(tx.try_send(1), Err(QueueError::Disconnected));
        assert_eq!(tx.send_priority(2), Err(QueueError::Disconnected));
    }
}
