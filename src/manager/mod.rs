// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device subscription engine.
//!
//! # Overview
//!
//! Each subscribed device gets a [`DeviceChannel`]: a state machine
//! ([`ChannelState`]), a buffer of events, and a map of replies awaited by
//! in-flight commands. A background listener task reads the device's push
//! channel and feeds the channel; the [`SubscriptionManager`] creates
//! channels, registers them and tears them down.
//!
//! # Lifecycle
//!
//! 1. `subscribe` opens a push channel, spawns its listener and waits for
//!    the service's `{"status": "connected"}` acknowledgement.
//! 2. It then sends the registration command and waits for any event.
//! 3. The channel stays registered until the service logs the session out,
//!    the stream ends or fails, the device is unsubscribed, or the manager
//!    shuts down. A closed channel is never reused.
//!
//! # Examples
//!
//! ```no_run
//! use arlo_lib::manager::ChannelState;
//! use arlo_lib::{Arlo, Device};
//!
//! # async fn example(arlo: Arlo<arlo_lib::protocol::HttpClient>, basestation: Device) -> arlo_lib::Result<()> {
//! if arlo.subscribe(&basestation).await? == ChannelState::Registered {
//!     let channel = arlo.subscriptions().channel(basestation.device_id()).unwrap();
//!     let mut state = channel.watch_state();
//!     tokio::spawn(async move {
//!         while state.changed().await.is_ok() {
//!             println!("channel state: {:?}", *state.borrow());
//!         }
//!     });
//! }
//! # Ok(())
//! # }
//! ```

mod channel;
mod config;
mod listener;
mod subscription_manager;

pub use channel::{ChannelState, DeviceChannel};
pub use config::SubscriptionConfig;
pub use subscription_manager::SubscriptionManager;
