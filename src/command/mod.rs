// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device command bodies.
//!
//! Commands are JSON objects posted to a device's notify endpoint. The
//! service does not answer them inline: the outcome arrives later on the
//! push channel, labeled with the command's transaction id.
//!
//! # Command Structure
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `action` | `get`, `set`, `add` or `delete` |
//! | `resource` | What the command addresses, e.g. `modes`, `cameras/<id>` |
//! | `from` | Sender id, `<userId>_web` |
//! | `to` | Target device id |
//! | `transId` | Correlation label for the reply |
//! | `publishResponse` | Whether the service broadcasts the resulting state |
//! | `properties` | Optional payload |
//!
//! `from`, `to` and `transId` are filled in by [`Command::stamp`] just
//! before the command is sent; builders only describe what to do.
//!
//! # Examples
//!
//! ```
//! use arlo_lib::command::{Action, Command};
//! use serde_json::json;
//!
//! let mut cmd = Command::set("modes")
//!     .publish_response(true)
//!     .with_properties(json!({"active": "mode1"}));
//! let trans_id = cmd.stamp("USER1", "BASE1");
//!
//! assert_eq!(cmd.action(), Action::Set);
//! assert_eq!(cmd.sender(), "USER1_web");
//! assert_eq!(cmd.to(), "BASE1");
//! assert_eq!(cmd.trans_id(), Some(&trans_id));
//! ```

pub mod basestation;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::TransId;

/// Suffix appended to the user id to form the web client's sender id.
const SENDER_SUFFIX: &str = "_web";

/// Command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Read a resource.
    Get,
    /// Update a resource.
    Set,
    /// Create a resource.
    Add,
    /// Remove a resource.
    Delete,
}

impl Action {
    /// Returns the wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Add => "add",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command addressed to one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    action: Action,
    resource: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trans_id: Option<TransId>,
    #[serde(default)]
    publish_response: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<Value>,
}

impl Command {
    /// Creates an unstamped command.
    #[must_use]
    pub fn new(action: Action, resource: impl Into<String>) -> Self {
        Self {
            action,
            resource: resource.into(),
            from: String::new(),
            to: String::new(),
            trans_id: None,
            publish_response: false,
            properties: None,
        }
    }

    /// Creates a `get` command.
    #[must_use]
    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(Action::Get, resource)
    }

    /// Creates a `set` command.
    #[must_use]
    pub fn set(resource: impl Into<String>) -> Self {
        Self::new(Action::Set, resource)
    }

    /// Creates an `add` command.
    #[must_use]
    pub fn add(resource: impl Into<String>) -> Self {
        Self::new(Action::Add, resource)
    }

    /// Creates a `delete` command.
    #[must_use]
    pub fn delete(resource: impl Into<String>) -> Self {
        Self::new(Action::Delete, resource)
    }

    /// Builds the handshake that routes `device_id`'s events to this
    /// user's push channel.
    #[must_use]
    pub fn register_subscription(user_id: &str, device_id: &str) -> Self {
        Self::set(format!("subscriptions/{user_id}{SENDER_SUFFIX}"))
            .with_properties(json!({ "devices": [device_id] }))
    }

    /// Sets the `publishResponse` flag.
    #[must_use]
    pub fn publish_response(mut self, publish: bool) -> Self {
        self.publish_response = publish;
        self
    }

    /// Sets the `properties` payload.
    #[must_use]
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Fills in the addressing fields and a fresh transaction id.
    ///
    /// Stamping an already stamped command replaces all three fields, so a
    /// command value can be sent more than once without its replies being
    /// confused.
    pub fn stamp(&mut self, user_id: &str, device_id: &str) -> TransId {
        let trans_id = TransId::generate();
        self.from = format!("{user_id}{SENDER_SUFFIX}");
        self.to = device_id.to_string();
        self.trans_id = Some(trans_id.clone());
        trans_id
    }

    /// Returns the action.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Returns the resource path.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the sender id (empty until stamped).
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// Returns the target device id (empty until stamped).
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Returns the transaction id, if stamped.
    #[must_use]
    pub const fn trans_id(&self) -> Option<&TransId> {
        self.trans_id.as_ref()
    }

    /// Returns the `publishResponse` flag.
    #[must_use]
    pub const fn publishes_response(&self) -> bool {
        self.publish_response
    }

    /// Returns the payload, if any.
    #[must_use]
    pub const fn properties(&self) -> Option<&Value> {
        self.properties.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstamped_command_omits_optional_fields() {
        let value = serde_json::to_value(Command::get("rules")).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "get",
                "resource": "rules",
                "from": "",
                "to": "",
                "publishResponse": false,
            })
        );
    }

    #[test]
    fn stamped_command_shape() {
        let mut cmd = Command::set("modes")
            .publish_response(true)
            .with_properties(json!({"active": "mode0"}));
        let trans_id = cmd.stamp("U1", "D1");

        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["action"], "set");
        assert_eq!(value["resource"], "modes");
        assert_eq!(value["from"], "U1_web");
        assert_eq!(value["to"], "D1");
        assert_eq!(value["transId"], trans_id.as_str());
        assert_eq!(value["publishResponse"], true);
        assert_eq!(value["properties"], json!({"active": "mode0"}));
    }

    #[test]
    fn restamping_replaces_trans_id() {
        let mut cmd = Command::get("modes");
        let first = cmd.stamp("U1", "D1");
        let second = cmd.stamp("U1", "D2");
        assert_ne!(first, second);
        assert_eq!(cmd.trans_id(), Some(&second));
        assert_eq!(cmd.to(), "D2");
    }

    #[test]
    fn registration_shape() {
        let cmd = Command::register_subscription("U1", "D1");
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["action"], "set");
        assert_eq!(value["resource"], "subscriptions/U1_web");
        assert_eq!(value["publishResponse"], false);
        assert_eq!(value["properties"], json!({"devices": ["D1"]}));
    }

    #[test]
    fn action_wire_names() {
        for action in [Action::Get, Action::Set, Action::Add, Action::Delete] {
            assert_eq!(serde_json::to_value(action).unwrap(), action.as_str());
        }
    }

    #[test]
    fn deserializes_received_command() {
        let cmd: Command = serde_json::from_value(json!({
            "action": "delete",
            "resource": "modes/mode3",
            "from": "U1_web",
            "to": "D1",
            "transId": "web!1!2",
            "publishResponse": true
        }))
        .unwrap();
        assert_eq!(cmd.action(), Action::Delete);
        assert_eq!(cmd.trans_id().map(TransId::as_str), Some("web!1!2"));
        assert!(cmd.properties().is_none());
    }
}
