// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription lifecycle: connect, register, unsubscribe, shut down.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::channel::{ChannelState, ChannelTable, DeviceChannel};
use super::config::SubscriptionConfig;
use super::listener::spawn_listener;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::event::Popped;
use crate::protocol::Transport;
use crate::types::Device;

/// Owns the device channel table and drives each channel's lifecycle.
///
/// Subscribing is idempotent and serialized per device: concurrent callers
/// for the same device share one push channel, one listener and one
/// registration. Devices are independent of each other.
///
/// Dropping the manager shuts it down, so no listener outlives it.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use arlo_lib::manager::{SubscriptionConfig, SubscriptionManager};
/// use arlo_lib::protocol::{HttpClient, HttpConfig};
///
/// # async fn example() -> arlo_lib::Result<()> {
/// let client = HttpClient::login(HttpConfig::new(), "user@example.com", "secret").await?;
/// let basestation = client.get_devices(Some("basestation")).await?.remove(0);
///
/// let manager = SubscriptionManager::new(Arc::new(client), SubscriptionConfig::default());
/// let state = manager.subscribe(&basestation).await?;
/// println!("{basestation}: {state:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SubscriptionManager<T: Transport> {
    transport: Arc<T>,
    config: SubscriptionConfig,
    channels: ChannelTable,
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    shutdown: CancellationToken,
}

impl<T: Transport> SubscriptionManager<T> {
    /// Creates a manager with no subscriptions.
    #[must_use]
    pub fn new(transport: Arc<T>, config: SubscriptionConfig) -> Self {
        Self {
            transport,
            config,
            channels: ChannelTable::default(),
            gates: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns the timing configuration.
    #[must_use]
    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Returns the live channel for a device, if any.
    ///
    /// A channel whose listener has stopped is removed here.
    #[must_use]
    pub fn channel(&self, device_id: &str) -> Option<Arc<DeviceChannel>> {
        let channel = self.channels.get(device_id)?;
        if channel.is_closed() {
            self.channels.remove_if_current(&channel);
            return None;
        }
        Some(channel)
    }

    /// Returns the state of a device's channel (`Unsubscribed` if none).
    #[must_use]
    pub fn state(&self, device_id: &str) -> ChannelState {
        self.channel(device_id)
            .map_or(ChannelState::Unsubscribed, |channel| channel.state())
    }

    /// Returns the ids of every device with a live channel.
    #[must_use]
    pub fn subscribed_devices(&self) -> Vec<String> {
        self.channels.remove_closed();
        self.channels.device_ids()
    }

    /// Returns `true` if `channel` is still the live channel of its device.
    #[must_use]
    pub fn is_current(&self, channel: &Arc<DeviceChannel>) -> bool {
        self.channels.is_current(channel)
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) was called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Returns a token cancelled on shutdown.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn gate(&self, device_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.gates.lock().entry(device_id.to_string()).or_default())
    }

    /// Forgets a device's gate unless another caller holds or awaits it.
    fn release_gate(&self, device_id: &str, gate: &Arc<tokio::sync::Mutex<()>>) {
        let mut gates = self.gates.lock();
        // One reference in the map, one in `gate`.
        if Arc::strong_count(gate) == 2
            && gates
                .get(device_id)
                .is_some_and(|current| Arc::ptr_eq(current, gate))
        {
            gates.remove(device_id);
        }
    }

    /// Connects and registers a device, reusing an existing channel when it
    /// is still connected.
    ///
    /// Returns the resulting state. Anything short of
    /// [`ChannelState::Registered`] means the push channel did not
    /// acknowledge within the connect timeout or the registration handshake
    /// did not complete within the register timeout; the caller may retry.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShutDown` after shutdown, and the transport's error
    /// if the push channel cannot be opened or the registration command
    /// cannot be sent.
    pub async fn subscribe(&self, device: &Device) -> Result<ChannelState> {
        if self.is_shut_down() {
            return Err(Error::ShutDown);
        }
        let device_id = device.device_id();

        if let Some(channel) = self.channel(device_id)
            && channel.is_registered()
        {
            return Ok(ChannelState::Registered);
        }

        let gate = self.gate(device_id);
        let _guard = gate.lock().await;

        let channel = match self.channel(device_id) {
            Some(channel) if channel.is_connected() => channel,
            stale => {
                if let Some(stale) = stale {
                    tracing::debug!(device = %device_id, "Replacing stale channel");
                    stale.disconnect();
                    self.channels.remove_if_current(&stale);
                }
                match self.connect(device).await? {
                    Some(channel) => channel,
                    None => return Ok(ChannelState::Unsubscribed),
                }
            }
        };

        if !channel.is_registered() {
            self.register(&channel).await?;
        }
        Ok(channel.state())
    }

    /// Opens a push channel for `device` and waits for its acknowledgement.
    async fn connect(&self, device: &Device) -> Result<Option<Arc<DeviceChannel>>> {
        let device_id = device.device_id();
        tracing::debug!(device = %device_id, "Opening push channel");

        let stream = self.transport.open_push_channel().await?;
        let channel = Arc::new(DeviceChannel::new(
            device.clone(),
            self.shutdown.child_token(),
        ));
        if let Some(previous) = self.channels.insert(Arc::clone(&channel)) {
            previous.disconnect();
        }
        spawn_listener(Arc::clone(&channel), stream);

        let mut state = channel.watch_state();
        let acknowledged = async { state.wait_for(|s| s.is_connected()).await.is_ok() };
        let connected = tokio::select! {
            biased;
            () = channel.closed_token().cancelled() => false,
            result = tokio::time::timeout(self.config.connect_timeout(), acknowledged) => {
                result.unwrap_or(false)
            }
        };

        if connected {
            return Ok(Some(channel));
        }

        tracing::warn!(
            device = %device_id,
            timeout_ms = u64::try_from(self.config.connect_timeout().as_millis()).unwrap_or(u64::MAX),
            "Push channel did not connect"
        );
        channel.disconnect();
        self.channels.remove_if_current(&channel);
        Ok(None)
    }

    /// Runs the registration handshake. Any event arriving within the
    /// register timeout completes it; an event that is not the
    /// registration reply goes back to the buffer.
    async fn register(&self, channel: &DeviceChannel) -> Result<()> {
        let device = channel.device();
        let user_id = self.transport.user_id();

        let mut command = Command::register_subscription(user_id, device.device_id());
        let trans_id = command.stamp(user_id, device.device_id());
        tracing::debug!(device = %device.device_id(), trans_id = %trans_id, "Registering");

        self.transport.notify(device, &command).await?;

        match channel
            .buffer()
            .pop(Some(self.config.register_timeout()))
            .await
        {
            Popped::Event(event) => {
                if event.trans_id() != Some(trans_id.as_str()) {
                    channel.buffer().push(event);
                }
                if channel.mark_registered() {
                    tracing::info!(device = %device.device_id(), "Registered");
                }
            }
            Popped::TimedOut => {
                tracing::warn!(device = %device.device_id(), "Registration timed out");
            }
            Popped::Woken | Popped::Closed => {
                tracing::debug!(device = %device.device_id(), "Disconnected while registering");
            }
        }
        Ok(())
    }

    /// Ends a device's subscription.
    ///
    /// If the channel is connected the session's push subscription is
    /// cancelled server-side. The channel is then closed and removed either
    /// way, so its listener stops. Returns `false` if the device had no
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the unsubscribe call fails; the
    /// channel is closed regardless.
    pub async fn unsubscribe(&self, device: &Device) -> Result<bool> {
        let device_id = device.device_id();
        let gate = self.gate(device_id);
        let guard = gate.lock().await;

        let Some(channel) = self.channels.remove(device_id) else {
            drop(guard);
            self.release_gate(device_id, &gate);
            return Ok(false);
        };

        let result = if channel.is_connected() {
            self.transport.unsubscribe().await
        } else {
            Ok(())
        };
        channel.disconnect();
        tracing::info!(device = %device_id, "Unsubscribed");

        drop(guard);
        self.release_gate(device_id, &gate);
        result?;
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn gate_count(&self) -> usize {
        self.gates.lock().len()
    }

    /// Stops every listener and wakes every waiter.
    ///
    /// Later subscribe calls fail with `Error::ShutDown`.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        tracing::info!("Shutting down subscriptions");
        self.shutdown.cancel();
        for channel in self.channels.drain() {
            channel.disconnect();
        }
        self.gates.lock().clear();
    }
}

impl<T: Transport> Drop for SubscriptionManager<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
