// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level Arlo client.

#[cfg(feature = "http")]
mod builder;

#[cfg(feature = "http")]
pub use builder::ArloBuilder;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::command::{self, Command};
use crate::dispatch;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::manager::{ChannelState, SubscriptionConfig, SubscriptionManager};
use crate::protocol::Transport;
use crate::subscription::{self, EventHandler, LoopExit, MotionFilter};
use crate::types::{Device, Mode, TransId};

/// Client for Arlo base stations and cameras.
///
/// Cloning is cheap; clones share the transport and every subscription.
///
/// Base station operations send a command and wait for its reply on the
/// push channel, subscribing the base station first if needed. They return
/// `Ok(None)` when no reply arrived in time or the channel went away.
///
/// # Examples
///
/// ```no_run
/// use arlo_lib::Arlo;
///
/// #[tokio::main]
/// async fn main() -> arlo_lib::Result<()> {
///     let arlo = Arlo::login("user@example.com", "secret").await?;
///     arlo.shutdown_on_interrupt();
///
///     let basestations = arlo.transport().get_devices(Some("basestation")).await?;
///     for basestation in &basestations {
///         if let Some(reply) = arlo.get_modes(basestation).await? {
///             println!("{basestation}: {:?}", reply.properties());
///         }
///     }
///
///     arlo.logout().await
/// }
/// ```
#[derive(Debug)]
pub struct Arlo<T: Transport> {
    manager: Arc<SubscriptionManager<T>>,
}

impl<T: Transport> Clone for Arlo<T> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

impl<T: Transport> Arlo<T> {
    /// Creates a client over an authenticated transport.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SubscriptionConfig::default())
    }

    /// Creates a client with custom subscription timing.
    #[must_use]
    pub fn with_config(transport: T, config: SubscriptionConfig) -> Self {
        Self {
            manager: Arc::new(SubscriptionManager::new(Arc::new(transport), config)),
        }
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        self.manager.transport()
    }

    /// Returns the subscription manager.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionManager<T> {
        &self.manager
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Connects and registers a device's push channel.
    ///
    /// # Errors
    ///
    /// See [`SubscriptionManager::subscribe`].
    pub async fn subscribe(&self, device: &Device) -> Result<ChannelState> {
        self.manager.subscribe(device).await
    }

    /// Ends a device's subscription. Returns `false` if it had none.
    ///
    /// # Errors
    ///
    /// See [`SubscriptionManager::unsubscribe`].
    pub async fn unsubscribe(&self, device: &Device) -> Result<bool> {
        self.manager.unsubscribe(device).await
    }

    /// Returns a device's channel state.
    #[must_use]
    pub fn state(&self, device: &Device) -> ChannelState {
        self.manager.state(device.device_id())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Sends a command without waiting for its reply and returns the
    /// transaction id the reply will carry.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShutDown` after shutdown, or the transport's error.
    pub async fn notify(&self, device: &Device, mut command: Command) -> Result<TransId> {
        if self.manager.is_shut_down() {
            return Err(Error::ShutDown);
        }
        dispatch::notify(self.transport(), device, &mut command).await
    }

    /// Sends a command and waits for its reply, at most the configured
    /// response timeout.
    ///
    /// # Errors
    ///
    /// See [`dispatch::notify_and_get_response`].
    pub async fn notify_and_get_response(
        &self,
        device: &Device,
        command: Command,
    ) -> Result<Option<Event>> {
        let timeout = self.manager.config().response_timeout();
        self.notify_and_get_response_within(device, command, Some(timeout))
            .await
    }

    /// Sends a command and waits for its reply, at most `timeout`
    /// (until the channel closes if `None`).
    ///
    /// # Errors
    ///
    /// See [`dispatch::notify_and_get_response`].
    pub async fn notify_and_get_response_within(
        &self,
        device: &Device,
        command: Command,
        timeout: Option<Duration>,
    ) -> Result<Option<Event>> {
        dispatch::notify_and_get_response(self.subscriptions(), device, command, timeout).await
    }

    // =========================================================================
    // Event callbacks
    // =========================================================================

    /// Feeds every event of `device` to `handler` until the channel goes
    /// away or no event arrives for `idle_timeout`.
    ///
    /// # Errors
    ///
    /// See [`subscription::handle_events`].
    pub async fn handle_events<H>(
        &self,
        device: &Device,
        handler: &mut H,
        idle_timeout: Option<Duration>,
    ) -> Result<LoopExit>
    where
        H: EventHandler + ?Sized,
    {
        subscription::handle_events(self.subscriptions(), device, handler, idle_timeout).await
    }

    /// Like [`handle_events`](Self::handle_events), but only motion events
    /// reach `handler`.
    ///
    /// # Errors
    ///
    /// See [`subscription::handle_events`].
    pub async fn subscribe_to_motion_events<H>(
        &self,
        device: &Device,
        handler: H,
        idle_timeout: Option<Duration>,
    ) -> Result<LoopExit>
    where
        H: EventHandler,
    {
        let mut filter = MotionFilter::new(handler);
        self.handle_events(device, &mut filter, idle_timeout).await
    }

    // =========================================================================
    // Base station
    // =========================================================================

    /// Queries the base station's state.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn get_basestation_state(&self, basestation: &Device) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::basestation_state())
            .await
    }

    /// Queries the state of the base station's cameras.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn get_camera_state(&self, basestation: &Device) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::camera_state())
            .await
    }

    /// Queries the automation rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn get_rules(&self, basestation: &Device) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::rules())
            .await
    }

    /// Queries the modes and which one is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn get_modes(&self, basestation: &Device) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::modes())
            .await
    }

    /// Queries the mode schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn get_calendar(&self, basestation: &Device) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::calendar())
            .await
    }

    /// Switches to the armed mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn arm(&self, basestation: &Device) -> Result<Option<Event>> {
        self.custom_mode(basestation, &Mode::Armed).await
    }

    /// Switches to the disarmed mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn disarm(&self, basestation: &Device) -> Result<Option<Event>> {
        self.custom_mode(basestation, &Mode::Disarmed).await
    }

    /// Turns the mode schedule on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn calendar(&self, basestation: &Device, active: bool) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::set_calendar(active))
            .await
    }

    /// Switches to any mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn custom_mode(&self, basestation: &Device, mode: &Mode) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::set_mode(mode))
            .await
    }

    /// Deletes a user-defined mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn delete_mode(&self, basestation: &Device, mode: &Mode) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::delete_mode(mode))
            .await
    }

    /// Turns a camera's privacy shield on (`true`) or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub async fn toggle_camera(
        &self,
        basestation: &Device,
        camera_id: &str,
        active: bool,
    ) -> Result<Option<Event>> {
        self.notify_and_get_response(basestation, command::basestation::set_privacy(camera_id, active))
            .await
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Stops every listener and wakes every blocked call.
    ///
    /// Blocked calls return their "no result" outcome; later calls fail
    /// with `Error::ShutDown`.
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }

    /// Returns `true` once the client was shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.manager.is_shut_down()
    }

    /// Shuts the client down when the process receives Ctrl-C.
    ///
    /// The watcher ends when the client is shut down or its last clone is
    /// dropped, and does not keep the client alive.
    pub fn shutdown_on_interrupt(&self) -> JoinHandle<()> {
        let manager = Arc::downgrade(&self.manager);
        let done = self.manager.shutdown_token();
        tokio::spawn(async move {
            tokio::select! {
                () = done.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => tracing::info!("Interrupt received"),
                        Err(e) => tracing::warn!(error = %e, "Cannot listen for interrupts"),
                    }
                    if let Some(manager) = manager.upgrade() {
                        manager.shutdown();
                    }
                }
            }
        })
    }
}

#[cfg(feature = "http")]
impl Arlo<crate::protocol::HttpClient> {
    /// Logs in with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the login request fails or is refused.
    pub async fn login(email: &str, password: &str) -> Result<Self> {
        Self::builder().credentials(email, password).login().await
    }

    /// Returns a builder for custom settings.
    #[must_use]
    pub fn builder() -> ArloBuilder {
        ArloBuilder::new()
    }

    /// Shuts the client down and ends the session server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout request fails.
    pub async fn logout(&self) -> Result<()> {
        self.shutdown();
        self.transport().logout().await
    }
}
