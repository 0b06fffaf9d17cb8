// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sending commands and correlating their replies.
//!
//! A command's outcome arrives on the device's push channel as an event
//! carrying the command's transaction id. [`notify_and_get_response`]
//! reserves a reply slot for that id before sending; the listener hands the
//! matching event straight to the slot and buffers everything else in
//! arrival order, so concurrent calls never see each other's replies and
//! general consumers never lose an event.

use std::time::Duration;

use crate::command::Command;
use crate::error::Result;
use crate::event::Event;
use crate::manager::SubscriptionManager;
use crate::protocol::Transport;
use crate::types::{Device, TransId};

/// Stamps `command` for `device` and sends it without waiting for the
/// reply.
///
/// Returns the transaction id the reply will carry.
///
/// # Errors
///
/// Returns the transport's error if the command cannot be sent.
pub async fn notify<T: Transport>(
    transport: &T,
    device: &Device,
    command: &mut Command,
) -> Result<TransId> {
    let trans_id = command.stamp(transport.user_id(), device.device_id());
    send(transport, device, command, &trans_id).await?;
    Ok(trans_id)
}

async fn send<T: Transport>(
    transport: &T,
    device: &Device,
    command: &Command,
    trans_id: &TransId,
) -> Result<()> {
    tracing::debug!(
        device = %device.device_id(),
        trans_id = %trans_id,
        action = %command.action(),
        resource = command.resource(),
        "Sending command"
    );
    transport.notify(device, command).await?;
    Ok(())
}

/// Sends `command` and waits for its reply.
///
/// The device is subscribed first if needed. `timeout` bounds the whole
/// wait for the reply, however many unrelated events arrive meanwhile;
/// `None` waits until the reply arrives or the channel closes.
///
/// Returns `Ok(None)` when no reply is available: the device could not be
/// registered, the deadline passed, or the channel was disconnected. The
/// command may still have taken effect in the latter two cases.
///
/// # Errors
///
/// Returns the transport's error if the subscription cannot be set up or
/// the command cannot be sent, and `Error::ShutDown` if called after
/// shutdown. A shutdown during the wait yields `Ok(None)`.
pub async fn notify_and_get_response<T: Transport>(
    manager: &SubscriptionManager<T>,
    device: &Device,
    mut command: Command,
    timeout: Option<Duration>,
) -> Result<Option<Event>> {
    let device_id = device.device_id();

    if !manager.subscribe(device).await?.is_registered() {
        tracing::debug!(device = %device_id, "Device not registered, no reply possible");
        return Ok(None);
    }
    let Some(channel) = manager.channel(device_id) else {
        return Ok(None);
    };

    let transport = manager.transport().as_ref();
    let trans_id = command.stamp(transport.user_id(), device_id);

    let Some(mut reply) = channel.expect_reply(&trans_id) else {
        tracing::debug!(device = %device_id, "Channel closed before sending");
        return Ok(None);
    };
    send(transport, device, &command, &trans_id).await?;

    let event = reply.wait(timeout).await;
    if event.is_none() {
        tracing::warn!(
            device = %device_id,
            trans_id = %trans_id,
            disconnected = channel.is_closed(),
            "No reply received"
        );
    }
    Ok(event)
}
