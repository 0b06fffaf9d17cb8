// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Arlo` Lib - A Rust library to control Arlo base stations and cameras.
//!
//! The Arlo cloud does not answer device commands inline. A command is
//! posted to the device's notify endpoint, and its outcome arrives later on
//! a server-sent event stream shared with every other event of the session
//! (mode changes, motion, replies to other commands). This library turns
//! that into plain request/response calls while keeping every other event
//! available to callback consumers.
//!
//! # Supported Features
//!
//! - **Modes**: Arm, disarm, custom modes, schedule
//! - **State queries**: Base station, cameras, rules, modes, calendar
//! - **Events**: Per-device callback loops, motion filtering
//! - **Account and library**: Devices, profile, locations, recordings
//! - **Cameras**: Live stream URLs, snapshots, recordings, privacy shield
//!
//! # Architecture
//!
//! | Layer | Module |
//! |-------|--------|
//! | Facade | [`Arlo`] |
//! | Correlation | [`dispatch`] |
//! | Callback loop | [`subscription`] |
//! | Channel lifecycle | [`manager`] |
//! | Wire | [`protocol`], [`command`], [`event`] |
//!
//! The engine runs over any [`protocol::Transport`]; the HTTP transport is
//! behind the default `http` feature.
//!
//! # Quick Start
//!
//! ```no_run
//! use arlo_lib::Arlo;
//!
//! #[tokio::main]
//! async fn main() -> arlo_lib::Result<()> {
//!     let arlo = Arlo::login("user@example.com", "secret").await?;
//!     let basestation = arlo
//!         .transport()
//!         .get_devices(Some("basestation"))
//!         .await?
//!         .remove(0);
//!
//!     // Returns None if no reply arrived within the response timeout
//!     if let Some(reply) = arlo.arm(&basestation).await? {
//!         println!("armed: {:?}", reply.properties());
//!     }
//!
//!     arlo.logout().await
//! }
//! ```
//!
//! ## Motion Events
//!
//! ```no_run
//! use arlo_lib::{Arlo, Device};
//! use arlo_lib::event::Event;
//!
//! # async fn example(arlo: Arlo<arlo_lib::protocol::HttpClient>, basestation: Device) -> arlo_lib::Result<()> {
//! let exit = arlo
//!     .subscribe_to_motion_events(
//!         &basestation,
//!         |device: &Device, event: &Event| println!("motion on {device}: {:?}", event.resource()),
//!         None,
//!     )
//!     .await?;
//! println!("event loop ended: {exit:?}");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod manager;
pub mod protocol;
pub mod subscription;
pub mod types;

#[cfg(feature = "http")]
pub use client::ArloBuilder;
pub use client::Arlo;
pub use command::{Action, Command};
pub use error::{Error, ParseError, ProtocolError, Result};
pub use event::{Event, EventKind};
pub use manager::{ChannelState, SubscriptionConfig};
pub use subscription::{EventHandler, LoopExit, MotionFilter};
pub use types::{Device, Mode, Recording, TransId};
