// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded push channel events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Role of an event in the push channel protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `{"status": "connected"}` on a channel that is not connected yet.
    ConnectionAck,
    /// `{"action": "logout"}`, the session ended server-side.
    Logout,
    /// Anything else: command replies, state changes, motion, ...
    Ordinary,
}

/// An event received on a device's push channel.
///
/// Events are JSON objects. Replies to commands carry the command's
/// `transId`; unsolicited events describe state through `action`,
/// `resource` and `properties`.
///
/// # Examples
///
/// ```
/// use arlo_lib::event::{Event, EventKind};
///
/// let event = Event::from_payload(
///     r#"{"resource":"cameras/ABC","action":"is","properties":{"motionDetected":true}}"#,
/// )?;
/// assert_eq!(event.classify(true), EventKind::Ordinary);
/// assert_eq!(event.resource(), Some("cameras/ABC"));
/// assert!(event.motion_detected());
/// # Ok::<(), arlo_lib::error::ParseError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Decodes a raw push payload.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the payload is not JSON or not a JSON object.
    pub fn from_payload(payload: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_value(value)
    }

    /// Wraps an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnexpectedFormat` if the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ParseError::UnexpectedFormat(format!(
                "push event is not a JSON object: {other}"
            ))),
        }
    }

    /// Classifies the event for a channel that is (`connected`) or is not
    /// yet connected.
    ///
    /// `{"status": "connected"}` is an acknowledgement only before the
    /// channel is connected. Any other event is a logout if its `action` is
    /// `logout`, whatever else it carries.
    #[must_use]
    pub fn classify(&self, connected: bool) -> EventKind {
        if !connected && self.status() == Some("connected") {
            EventKind::ConnectionAck
        } else if self.action() == Some("logout") {
            EventKind::Logout
        } else {
            EventKind::Ordinary
        }
    }

    /// Returns a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the transaction id, present only on command replies.
    #[must_use]
    pub fn trans_id(&self) -> Option<&str> {
        self.str_field("transId")
    }

    /// Returns the `action` field.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.str_field("action")
    }

    /// Returns the `resource` field.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        self.str_field("resource")
    }

    /// Returns the `status` field.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.str_field("status")
    }

    /// Returns the sender (`from`) field.
    #[must_use]
    pub fn sender(&self) -> Option<&str> {
        self.str_field("from")
    }

    /// Returns the `properties` payload.
    #[must_use]
    pub fn properties(&self) -> Option<&Value> {
        self.0.get("properties")
    }

    /// Returns `true` if `properties.motionDetected` is truthy.
    #[must_use]
    pub fn motion_detected(&self) -> bool {
        self.properties()
            .and_then(|p| p.get("motionDetected"))
            .is_some_and(is_truthy)
    }

    /// Returns `true` if the event has no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the event as a JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the event and returns it as a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// JSON truthiness: `false`, `null`, `0`, `""`, `[]` and `{}` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
