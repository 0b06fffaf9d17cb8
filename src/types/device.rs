// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Addressable Arlo devices.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An addressable Arlo device (base station, camera, ...).
///
/// Instances are normally obtained from the device list returned by the
/// service, but can also be built by hand when the identifiers are known.
/// Commands are addressed with [`device_id`](Self::device_id) and routed by
/// the cloud using [`xcloud_id`](Self::xcloud_id).
///
/// # Examples
///
/// ```
/// use arlo_lib::Device;
///
/// let base = Device::new("4R0123456789A", "XXXX-XXXX-12345678");
/// assert_eq!(base.device_id(), "4R0123456789A");
/// assert!(base.parent_id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    device_id: String,
    #[serde(rename = "xCloudId", default)]
    xcloud_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    properties: Value,
}

impl Device {
    /// Device type reported for base stations.
    pub const BASESTATION: &'static str = "basestation";
    /// Device type reported for cameras.
    pub const CAMERA: &'static str = "camera";

    /// Creates a device reference from its identifiers.
    #[must_use]
    pub fn new(device_id: impl Into<String>, xcloud_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            xcloud_id: xcloud_id.into(),
            parent_id: None,
            device_type: None,
            device_name: None,
            unique_id: None,
            properties: Value::Null,
        }
    }

    /// Sets the parent device (the base station a camera belongs to).
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Sets the device type.
    #[must_use]
    pub fn with_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Sets the device name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    /// Sets the device properties.
    #[must_use]
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    /// Returns the stable device identifier.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the auxiliary routing identifier.
    #[must_use]
    pub fn xcloud_id(&self) -> &str {
        &self.xcloud_id
    }

    /// Returns the parent device identifier, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Returns the device type (`basestation`, `camera`, ...).
    #[must_use]
    pub fn device_type(&self) -> Option<&str> {
        self.device_type.as_deref()
    }

    /// Returns the user-facing device name.
    #[must_use]
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    /// Returns the unique id (`<userId>_<deviceId>`), if reported.
    #[must_use]
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    /// Returns the raw device properties.
    #[must_use]
    pub fn properties(&self) -> &Value {
        &self.properties
    }

    /// Returns the Olson time zone of the device, if reported.
    #[must_use]
    pub fn olson_time_zone(&self) -> Option<&str> {
        self.properties.get("olsonTimeZone").and_then(Value::as_str)
    }

    /// Returns `true` if the device is of the given type.
    #[must_use]
    pub fn is_type(&self, device_type: &str) -> bool {
        self.device_type.as_deref() == Some(device_type)
    }

    /// Returns `true` if the device is a base station.
    #[must_use]
    pub fn is_basestation(&self) -> bool {
        self.is_type(Self::BASESTATION)
    }

    /// Returns `true` if the device is a camera.
    #[must_use]
    pub fn is_camera(&self) -> bool {
        self.is_type(Self::CAMERA)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.device_name {
            Some(name) => write!(f, "{name} ({})", self.device_id),
            None => write!(f, "{}", self.device_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_device_list_entry() {
        let json = serde_json::json!({
            "deviceId": "48B45597D8FF5",
            "deviceName": "Front Door",
            "deviceType": "camera",
            "xCloudId": "ABCD-1234-567890",
            "parentId": "4R0123456789A",
            "uniqueId": "336-4764296_48B45597D8FF5",
            "state": "provisioned",
            "properties": { "olsonTimeZone": "America/Chicago" }
        });

        let device: Device = serde_json::from_value(json).unwrap();
        assert_eq!(device.device_id(), "48B45597D8FF5");
        assert_eq!(device.xcloud_id(), "ABCD-1234-567890");
        assert_eq!(device.parent_id(), Some("4R0123456789A"));
        assert_eq!(device.olson_time_zone(), Some("America/Chicago"));
        assert!(device.is_camera());
        assert!(!device.is_basestation());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let device: Device =
            serde_json::from_value(serde_json::json!({ "deviceId": "4R0123456789A" })).unwrap();
        assert_eq!(device.xcloud_id(), "");
        assert!(device.device_type().is_none());
        assert!(device.properties().is_null());
    }

    #[test]
    fn display_prefers_name() {
        let named = Device::new("ID1", "X").with_name("Garage");
        assert_eq!(named.to_string(), "Garage (ID1)");
        assert_eq!(Device::new("ID2", "X").to_string(), "ID2");
    }

    #[test]
    fn builder_sets_fields() {
        let device = Device::new("CAM", "X")
            .with_parent("BASE")
            .with_type(Device::BASESTATION);
        assert_eq!(device.parent_id(), Some("BASE"));
        assert!(device.is_basestation());
    }
}
