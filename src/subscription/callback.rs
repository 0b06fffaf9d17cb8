// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event handlers.

use crate::event::Event;
use crate::types::Device;

/// Receives events from [`handle_events`](super::handle_events).
///
/// Any `FnMut(&Device, &Event) + Send` closure is a handler.
///
/// # Examples
///
/// ```
/// use arlo_lib::Device;
/// use arlo_lib::event::Event;
/// use arlo_lib::subscription::EventHandler;
///
/// let mut seen = Vec::new();
/// let mut handler = |device: &Device, event: &Event| {
///     seen.push((device.device_id().to_string(), event.resource().map(str::to_string)));
/// };
///
/// let device = Device::new("BASE1", "XC1");
/// let event = Event::from_payload(r#"{"resource":"modes"}"#).unwrap();
/// handler.handle(&device, &event);
/// drop(handler);
///
/// assert_eq!(seen, vec![("BASE1".to_string(), Some("modes".to_string()))]);
/// ```
pub trait EventHandler: Send {
    /// Called once per delivered event.
    fn handle(&mut self, device: &Device, event: &Event);
}

impl<F> EventHandler for F
where
    F: FnMut(&Device, &Event) + Send,
{
    fn handle(&mut self, device: &Device, event: &Event) {
        self(device, event);
    }
}

/// Forwards only motion events: those whose `properties.motionDetected`
/// is truthy.
#[derive(Debug, Clone)]
pub struct MotionFilter<H> {
    inner: H,
}

impl<H: EventHandler> MotionFilter<H> {
    /// Wraps a handler.
    #[must_use]
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    /// Returns the wrapped handler.
    #[must_use]
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: EventHandler> EventHandler for MotionFilter<H> {
    fn handle(&mut self, device: &Device, event: &Event) {
        if event.motion_detected() {
            self.inner.handle(device, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn motion_filter_forwards_only_motion() {
        let device = Device::new("BASE1", "XC1");
        let mut count = 0;
        {
            let mut filter = MotionFilter::new(|_: &Device, _: &Event| count += 1);
            for value in [
                json!({"properties": {"motionDetected": true}}),
                json!({"properties": {"motionDetected": false}}),
                json!({"resource": "modes"}),
                json!({"properties": {"motionDetected": 1}}),
            ] {
                filter.handle(&device, &Event::from_value(value).unwrap());
            }
        }
        assert_eq!(count, 2);
    }
}
