// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Caller-driven event loop.

use std::time::Duration;

use super::EventHandler;
use crate::error::Result;
use crate::event::Popped;
use crate::manager::SubscriptionManager;
use crate::protocol::Transport;
use crate::types::Device;

/// Why [`handle_events`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The device could not be registered.
    NotSubscribed,
    /// The device's channel was disconnected (logout, stream end, stream
    /// failure or unsubscribe).
    Disconnected,
    /// The device's channel was replaced or removed from the manager.
    Removed,
    /// No event arrived within the idle timeout.
    IdleTimeout,
    /// The manager was shut down.
    Shutdown,
}

/// Subscribes `device` and feeds every buffered event to `handler` until
/// the channel goes away.
///
/// Runs on the caller's task; to watch several devices, run one loop per
/// device concurrently. Empty events are skipped. `idle_timeout` ends the
/// loop when no event arrives for that long; `None` waits indefinitely.
///
/// Replies awaited by concurrent
/// [`notify_and_get_response`](crate::dispatch::notify_and_get_response)
/// calls never reach the handler.
///
/// # Errors
///
/// Returns the transport's error if the subscription cannot be set up.
pub async fn handle_events<T, H>(
    manager: &SubscriptionManager<T>,
    device: &Device,
    handler: &mut H,
    idle_timeout: Option<Duration>,
) -> Result<LoopExit>
where
    T: Transport,
    H: EventHandler + ?Sized,
{
    let device_id = device.device_id();
    if manager.is_shut_down() {
        return Ok(LoopExit::Shutdown);
    }
    if !manager.subscribe(device).await?.is_registered() {
        return Ok(LoopExit::NotSubscribed);
    }
    let Some(channel) = manager.channel(device_id) else {
        return Ok(LoopExit::Removed);
    };

    tracing::debug!(device = %device_id, "Handling events");

    loop {
        match channel.buffer().pop(idle_timeout).await {
            Popped::Event(event) if event.is_empty() => {}
            Popped::Event(event) => handler.handle(device, &event),
            Popped::TimedOut => return Ok(LoopExit::IdleTimeout),
            Popped::Woken | Popped::Closed => {}
        }

        if manager.is_shut_down() {
            return Ok(LoopExit::Shutdown);
        }
        if channel.is_closed() {
            tracing::debug!(device = %device_id, "Event loop ended by disconnect");
            return Ok(LoopExit::Disconnected);
        }
        if !manager.is_current(&channel) {
            return Ok(LoopExit::Removed);
        }
    }
}
