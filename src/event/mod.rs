// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push channel events.
//!
//! The service reports command outcomes and unrelated state changes on a
//! single push channel per session. Each payload is decoded into an
//! [`Event`] and either handed to the command waiting for it or queued in
//! the device's [`EventBuffer`] for general consumers.
//!
//! # Examples
//!
//! ```
//! use arlo_lib::event::{Event, EventBuffer, Popped};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let buffer = EventBuffer::new(CancellationToken::new());
//! buffer.push(Event::from_payload(r#"{"resource":"modes","action":"is"}"#).unwrap());
//!
//! assert!(matches!(buffer.pop(None).await, Popped::Event(_)));
//! # }
//! ```

mod event_buffer;
mod push_event;

pub use event_buffer::{EventBuffer, Popped};
pub use push_event::{Event, EventKind};
