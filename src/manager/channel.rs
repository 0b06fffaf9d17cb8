// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device channel state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::event::{Event, EventBuffer};
use crate::types::{Device, TransId};

/// Lifecycle state of a device channel.
///
/// ```text
/// Unsubscribed --ack--> Connected --registration--> Registered
///      ^                    |                           |
///      +----- disconnect ---+---------------------------+
/// ```
///
/// A channel that went back to `Unsubscribed` is closed for good; the next
/// subscribe creates a new channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// No open push channel, or the channel was closed.
    Unsubscribed,
    /// The push channel acknowledged the connection.
    Connected,
    /// The device's events are routed to this client.
    Registered,
}

impl ChannelState {
    /// Returns `true` for `Connected` and `Registered`.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::Registered)
    }

    /// Returns `true` for `Registered`.
    #[must_use]
    pub const fn is_registered(self) -> bool {
        matches!(self, Self::Registered)
    }
}

/// Everything the engine tracks for one subscribed device.
///
/// The listener task writes to it (connection ack, events, disconnect);
/// the subscription manager marks it registered; consumers read events
/// from its buffer or wait for replies in its pending map.
#[derive(Debug)]
pub struct DeviceChannel {
    device: Device,
    state: watch::Sender<ChannelState>,
    buffer: EventBuffer,
    pending: Mutex<HashMap<String, oneshot::Sender<Event>>>,
    closed: CancellationToken,
}

impl DeviceChannel {
    /// Creates an unsubscribed channel that closes when `closed` is
    /// cancelled.
    pub(crate) fn new(device: Device, closed: CancellationToken) -> Self {
        let (state, _) = watch::channel(ChannelState::Unsubscribed);
        Self {
            device,
            state,
            buffer: EventBuffer::new(closed.clone()),
            pending: Mutex::new(HashMap::new()),
            closed,
        }
    }

    /// Returns the device this channel belongs to.
    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Returns a receiver that observes state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    /// Returns `true` if the push channel is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns `true` if the device is registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.state().is_registered()
    }

    /// Returns `true` once the channel was disconnected.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Returns the buffer of events not claimed by a pending reply.
    #[must_use]
    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    /// Returns the number of replies currently awaited.
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        self.pending.lock().len()
    }

    pub(crate) fn closed_token(&self) -> &CancellationToken {
        &self.closed
    }

    /// `Unsubscribed -> Connected`. Returns `false` if the channel was
    /// already connected or has been closed.
    pub(crate) fn mark_connected(&self) -> bool {
        let closed = self.is_closed();
        self.state.send_if_modified(|state| {
            if closed || *state != ChannelState::Unsubscribed {
                return false;
            }
            *state = ChannelState::Connected;
            true
        })
    }

    /// `Connected -> Registered`. Returns `false` from any other state.
    pub(crate) fn mark_registered(&self) -> bool {
        let closed = self.is_closed();
        self.state.send_if_modified(|state| {
            if closed || *state != ChannelState::Connected {
                return false;
            }
            *state = ChannelState::Registered;
            true
        })
    }

    /// Closes the channel for good and wakes every waiter.
    ///
    /// Pending replies resolve to nothing, a consumer blocked on the buffer
    /// wakes up, and the listener stops. Safe to call more than once.
    pub(crate) fn disconnect(&self) {
        self.closed.cancel();
        self.state.send_replace(ChannelState::Unsubscribed);
        self.buffer.wake();
        // Dropping the senders resolves every pending receiver.
        self.pending.lock().clear();
    }

    /// Routes an event to the reply slot awaiting its transaction id, or to
    /// the buffer when nobody awaits it.
    pub(crate) fn deliver(&self, event: Event) {
        let slot = event
            .trans_id()
            .and_then(|trans_id| self.pending.lock().remove(trans_id));

        match slot {
            Some(slot) => {
                tracing::debug!(
                    device = %self.device.device_id(),
                    trans_id = event.trans_id().unwrap_or_default(),
                    "Delivering reply"
                );
                // The waiter may have given up between lookup and send.
                if let Err(event) = slot.send(event) {
                    self.buffer.push(event);
                }
            }
            None => {
                tracing::trace!(device = %self.device.device_id(), "Buffering event");
                self.buffer.push(event);
            }
        }
    }

    /// Reserves a reply slot for `trans_id`.
    ///
    /// Returns `None` if the channel is already closed. The slot is
    /// released when the returned guard is dropped.
    pub(crate) fn expect_reply(self: &Arc<Self>, trans_id: &TransId) -> Option<PendingReply> {
        let mut pending = self.pending.lock();
        // Checked under the lock so a concurrent disconnect either sees
        // this slot when it clears the map or happened before it.
        if self.is_closed() {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        pending.insert(trans_id.as_str().to_string(), tx);
        Some(PendingReply {
            channel: Arc::clone(self),
            trans_id: trans_id.clone(),
            rx,
        })
    }
}

/// A reserved reply slot. Dropping it releases the slot.
#[derive(Debug)]
pub(crate) struct PendingReply {
    channel: Arc<DeviceChannel>,
    trans_id: TransId,
    rx: oneshot::Receiver<Event>,
}

impl PendingReply {
    /// Waits for the reply, at most `timeout` (until disconnect if `None`).
    pub(crate) async fn wait(&mut self, timeout: Option<Duration>) -> Option<Event> {
        let closed = self.channel.closed_token().clone();
        let rx = &mut self.rx;
        let reply = async {
            tokio::select! {
                biased;
                reply = rx => reply.ok(),
                () = closed.cancelled() => None,
            }
        };

        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, reply).await.ok().flatten(),
            None => reply.await,
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.channel.pending.lock().remove(self.trans_id.as_str());
    }
}

/// Device id to channel map.
#[derive(Debug, Default)]
pub(crate) struct ChannelTable {
    channels: RwLock<HashMap<String, Arc<DeviceChannel>>>,
}

impl ChannelTable {
    pub(crate) fn get(&self, device_id: &str) -> Option<Arc<DeviceChannel>> {
        self.channels.read().get(device_id).cloned()
    }

    /// Inserts a channel, returning the one it replaced.
    pub(crate) fn insert(&self, channel: Arc<DeviceChannel>) -> Option<Arc<DeviceChannel>> {
        let device_id = channel.device().device_id().to_string();
        self.channels.write().insert(device_id, channel)
    }

    pub(crate) fn remove(&self, device_id: &str) -> Option<Arc<DeviceChannel>> {
        self.channels.write().remove(device_id)
    }

    /// Removes `channel` only if it is still the entry for its device.
    pub(crate) fn remove_if_current(&self, channel: &Arc<DeviceChannel>) -> bool {
        let mut channels = self.channels.write();
        let device_id = channel.device().device_id();
        if channels
            .get(device_id)
            .is_some_and(|current| Arc::ptr_eq(current, channel))
        {
            channels.remove(device_id);
            return true;
        }
        false
    }

    pub(crate) fn is_current(&self, channel: &Arc<DeviceChannel>) -> bool {
        self.channels
            .read()
            .get(channel.device().device_id())
            .is_some_and(|current| Arc::ptr_eq(current, channel))
    }

    /// Removes every disconnected channel.
    pub(crate) fn remove_closed(&self) {
        self.channels.write().retain(|_, channel| !channel.is_closed());
    }

    pub(crate) fn drain(&self) -> Vec<Arc<DeviceChannel>> {
        self.channels.write().drain().map(|(_, channel)| channel).collect()
    }

    pub(crate) fn device_ids(&self) -> Vec<String> {
        self.channels.read().keys().cloned().collect()
    }
}
