// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport to the Arlo cloud.
//!
//! The subscription engine needs only three things from the network: a way
//! to post a command to a device, a way to end the push subscription, and
//! the push channel itself. [`Transport`] captures exactly that, so the
//! engine can be driven by the real [`HttpClient`] or by any in-memory
//! implementation.
//!
//! # Protocols
//!
//! - [`HttpClient`]: authenticated REST calls plus the server-sent event
//!   push channel (feature `http`, enabled by default)
//! - [`sse`]: framing decoder for `text/event-stream` bodies

pub mod sse;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig, Session};

use std::future::Future;

use futures_util::stream::BoxStream;

use crate::command::Command;
use crate::error::ProtocolError;
use crate::types::Device;

/// Raw push channel payloads, one JSON document per item.
///
/// An `Err` item reports an I/O failure; the stream ending means the
/// service closed the channel.
pub type PushStream = BoxStream<'static, Result<String, ProtocolError>>;

/// Authenticated access to the service, as needed by the subscription
/// engine.
///
/// Futures returned by every method are `Send` so they can be awaited from
/// spawned tasks.
pub trait Transport: Send + Sync + 'static {
    /// Returns the id of the logged-in user.
    fn user_id(&self) -> &str;

    /// Posts a stamped command to the device's notify endpoint.
    ///
    /// Success only means the command was accepted for delivery; the
    /// outcome arrives on the push channel.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the command could not be transmitted or
    /// the service rejected it.
    fn notify(
        &self,
        device: &Device,
        command: &Command,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;

    /// Ends the session's push subscription.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn unsubscribe(&self) -> impl Future<Output = Result<(), ProtocolError>> + Send;

    /// Opens a fresh push channel for the session.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the channel cannot be opened.
    fn open_push_channel(&self) -> impl Future<Output = Result<PushStream, ProtocolError>> + Send;
}
