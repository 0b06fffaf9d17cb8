// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device FIFO of push events.

use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use super::Event;

/// An entry in the buffer.
#[derive(Debug)]
enum Item {
    Event(Event),
    /// Carries no data; only wakes a blocked consumer.
    Wake,
}

/// Outcome of [`EventBuffer::pop`].
#[derive(Debug, Clone, PartialEq)]
pub enum Popped {
    /// The next event in arrival order.
    Event(Event),
    /// A wake sentinel was consumed; the consumer should re-check the
    /// channel state.
    Woken,
    /// Nothing arrived before the timeout.
    TimedOut,
    /// The owning channel was closed and the buffer is exhausted.
    Closed,
}

/// Unbounded FIFO of events for one device.
///
/// Any number of producers may push concurrently (the listener, and
/// consumers putting back events they do not need). Pops are serialized:
/// the receiving half sits behind an async mutex so exactly one consumer
/// pops at a time, and a waiting consumer queues on the mutex within its
/// own timeout.
///
/// Closing is driven by the owning channel's cancellation token. Events
/// still queued when the token fires are handed out first; after that,
/// pops return [`Popped::Closed`] without waiting.
#[derive(Debug)]
pub struct EventBuffer {
    tx: mpsc::UnboundedSender<Item>,
    rx: Mutex<mpsc::UnboundedReceiver<Item>>,
    closed: CancellationToken,
}

impl EventBuffer {
    /// Creates an empty buffer that closes when `closed` is cancelled.
    #[must_use]
    pub fn new(closed: CancellationToken) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            closed,
        }
    }

    /// Appends an event.
    pub fn push(&self, event: Event) {
        // The receiver lives in `self`, so the send cannot fail.
        let _ = self.tx.send(Item::Event(event));
    }

    /// Appends a wake sentinel.
    pub fn wake(&self) {
        let _ = self.tx.send(Item::Wake);
    }

    /// Removes the next entry, waiting up to `timeout` (forever if `None`).
    ///
    /// The timeout also bounds the wait for the consumer lock.
    pub async fn pop(&self, timeout: Option<Duration>) -> Popped {
        let next = async {
            let mut rx = self.rx.lock().await;
            tokio::select! {
                biased;
                item = rx.recv() => match item {
                    Some(Item::Event(event)) => Popped::Event(event),
                    Some(Item::Wake) => Popped::Woken,
                    None => Popped::Closed,
                },
                () = self.closed.cancelled() => Popped::Closed,
            }
        };

        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, next)
                .await
                .unwrap_or(Popped::TimedOut),
            None => next.await,
        }
    }

    /// Removes every queued event without waiting, skipping sentinels.
    ///
    /// Panics if another consumer is popping.
    #[cfg(test)]
    pub(crate) fn drain(&self) -> Vec<Event> {
        let mut rx = self
            .rx
            .try_lock()
            .expect("drained while another consumer pops");
        let mut events = Vec::new();
        while let Ok(item) = rx.try_recv() {
            if let Item::Event(event) = item {
                events.push(event);
            }
        }
        events
    }

    /// Returns `true` if the owning channel was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(n: u32) -> Event {
        Event::from_value(json!({ "seq": n })).unwrap()
    }

    fn buffer() -> EventBuffer {
        EventBuffer::new(CancellationToken::new())
    }

    #[tokio::test]
    async fn pops_in_push_order() {
        let buffer = buffer();
        for n in 0..5 {
            buffer.push(event(n));
        }
        for n in 0..5 {
            assert_eq!(buffer.pop(Some(Duration::from_millis(10))).await, Popped::Event(event(n)));
        }
    }

    #[tokio::test]
    async fn pop_times_out_when_empty() {
        let buffer = buffer();
        assert_eq!(buffer.pop(Some(Duration::from_millis(20))).await, Popped::TimedOut);
    }

    #[tokio::test]
    async fn wake_unblocks_waiting_consumer() {
        let buffer = std::sync::Arc::new(buffer());
        let waiter = {
            let buffer = buffer.clone();
            tokio::spawn(async move { buffer.pop(None).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        buffer.wake();
        assert_eq!(waiter.await.unwrap(), Popped::Woken);
    }

    #[tokio::test]
    async fn close_unblocks_waiting_consumer() {
        let token = CancellationToken::new();
        let buffer = std::sync::Arc::new(EventBuffer::new(token.clone()));
        let waiter = {
            let buffer = buffer.clone();
            tokio::spawn(async move { buffer.pop(None).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        assert_eq!(waiter.await.unwrap(), Popped::Closed);
        assert!(buffer.is_closed());
    }

    #[tokio::test]
    async fn queued_events_survive_close() {
        let token = CancellationToken::new();
        let buffer = EventBuffer::new(token.clone());
        buffer.push(event(1));
        token.cancel();
        assert_eq!(buffer.pop(None).await, Popped::Event(event(1)));
        assert_eq!(buffer.pop(None).await, Popped::Closed);
    }

    #[tokio::test]
    async fn drain_skips_sentinels() {
        let buffer = buffer();
        buffer.push(event(1));
        buffer.wake();
        buffer.push(event(2));
        assert_eq!(buffer.drain(), vec![event(1), event(2)]);
        assert!(buffer.drain().is_empty());
    }

    #[tokio::test]
    #[should_panic(expected = "another consumer pops")]
    async fn drain_refuses_to_race_a_consumer() {
        let buffer = std::sync::Arc::new(buffer());
        let waiter = {
            let buffer = buffer.clone();
            tokio::spawn(async move { buffer.pop(None).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let _ = buffer.drain();
        waiter.abort();
    }

    #[tokio::test]
    async fn pushed_back_event_goes_to_tail() {
        let buffer = buffer();
        buffer.push(event(1));
        buffer.push(event(2));
        let Popped::Event(first) = buffer.pop(None).await else {
            panic!("expected an event");
        };
        buffer.push(first);
        assert_eq!(buffer.drain(), vec![event(2), event(1)]);
    }
}
