// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback-driven event consumption.
//!
//! [`handle_events`] drains a device's event buffer and hands each event
//! to an [`EventHandler`]. It shares the buffer with nothing else that
//! could lose events: command replies are claimed before they are
//! buffered, so the loop and correlated calls can run against the same
//! device at the same time.
//!
//! # Usage
//!
//! ```no_run
//! use arlo_lib::subscription::{LoopExit, MotionFilter};
//! use arlo_lib::{Arlo, Device};
//! use arlo_lib::event::Event;
//!
//! # async fn example(arlo: Arlo<arlo_lib::protocol::HttpClient>, basestation: Device) -> arlo_lib::Result<()> {
//! let mut on_motion = MotionFilter::new(|device: &Device, event: &Event| {
//!     println!("motion on {device}: {:?}", event.resource());
//! });
//! let exit = arlo.handle_events(&basestation, &mut on_motion, None).await?;
//! assert_ne!(exit, LoopExit::IdleTimeout);
//! # Ok(())
//! # }
//! ```

mod callback;
mod event_loop;

pub use callback::{EventHandler, MotionFilter};
pub use event_loop::{LoopExit, handle_events};
