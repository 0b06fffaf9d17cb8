// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Base station security modes.

use std::fmt;

/// A base station mode as addressed by the `modes` resource.
///
/// Modes `mode0` and `mode1` are the built-in disarmed and armed modes;
/// every other id refers to a user-defined mode.
///
/// # Examples
///
/// ```
/// use arlo_lib::Mode;
///
/// assert_eq!(Mode::Armed.as_str(), "mode1");
/// assert_eq!(Mode::from("mode0"), Mode::Disarmed);
/// assert_eq!(Mode::from("mode3"), Mode::Custom("mode3".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mode {
    /// The built-in disarmed mode (`mode0`).
    Disarmed,
    /// The built-in armed mode (`mode1`).
    Armed,
    /// A user-defined mode, by id.
    Custom(String),
}

impl Mode {
    /// Returns the mode id used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Disarmed => "mode0",
            Self::Armed => "mode1",
            Self::Custom(id) => id,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Mode {
    fn from(id: &str) -> Self {
        match id {
            "mode0" => Self::Disarmed,
            "mode1" => Self::Armed,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for Mode {
    fn from(id: String) -> Self {
        Self::from(id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_modes_round_trip_through_ids() {
        for mode in [Mode::Disarmed, Mode::Armed] {
            assert_eq!(Mode::from(mode.as_str()), mode);
        }
    }

    #[test]
    fn custom_mode_keeps_id() {
        let mode = Mode::from("mode7".to_string());
        assert_eq!(mode.to_string(), "mode7");
    }
}
