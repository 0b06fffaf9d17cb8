// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-shape base station commands.

use serde_json::json;

use super::Command;
use crate::types::Mode;

/// Queries the base station's own state.
#[must_use]
pub fn basestation_state() -> Command {
    Command::get("basestation")
}

/// Queries the state of every camera attached to the base station.
#[must_use]
pub fn camera_state() -> Command {
    Command::get("cameras")
}

/// Queries the automation rules.
#[must_use]
pub fn rules() -> Command {
    Command::get("rules")
}

/// Queries the defined modes and which one is active.
#[must_use]
pub fn modes() -> Command {
    Command::get("modes")
}

/// Queries the mode schedule.
#[must_use]
pub fn calendar() -> Command {
    Command::get("schedule")
}

/// Activates a mode.
///
/// ```
/// use arlo_lib::Mode;
/// use arlo_lib::command::basestation;
///
/// let cmd = basestation::set_mode(&Mode::Armed);
/// assert_eq!(cmd.resource(), "modes");
/// assert_eq!(cmd.properties().unwrap()["active"], "mode1");
/// ```
#[must_use]
pub fn set_mode(mode: &Mode) -> Command {
    Command::set("modes")
        .publish_response(true)
        .with_properties(json!({ "active": mode.as_str() }))
}

/// Turns the mode schedule on or off.
#[must_use]
pub fn set_calendar(active: bool) -> Command {
    Command::set("schedule")
        .publish_response(true)
        .with_properties(json!({ "active": active }))
}

/// Deletes a user-defined mode.
#[must_use]
pub fn delete_mode(mode: &Mode) -> Command {
    Command::delete(format!("modes/{mode}")).publish_response(true)
}

/// Turns a camera's privacy shield on (`true`) or off.
#[must_use]
pub fn set_privacy(camera_id: &str, active: bool) -> Command {
    Command::set(format!("cameras/{camera_id}"))
        .publish_response(true)
        .with_properties(json!({ "privacyActive": active }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Action;
    use serde_json::Value;

    fn shape(cmd: &Command) -> (Action, &str, bool, Option<&Value>) {
        (
            cmd.action(),
            cmd.resource(),
            cmd.publishes_response(),
            cmd.properties(),
        )
    }

    #[test]
    fn queries_do_not_publish() {
        let cases = [
            (basestation_state(), "basestation"),
            (camera_state(), "cameras"),
            (rules(), "rules"),
            (modes(), "modes"),
            (calendar(), "schedule"),
        ];
        for (cmd, resource) in &cases {
            assert_eq!(shape(cmd), (Action::Get, *resource, false, None));
        }
    }

    #[test]
    fn arm_and_disarm() {
        let arm = set_mode(&Mode::Armed);
        assert_eq!(
            shape(&arm),
            (Action::Set, "modes", true, Some(&json!({"active": "mode1"})))
        );
        let disarm = set_mode(&Mode::Disarmed);
        assert_eq!(disarm.properties(), Some(&json!({"active": "mode0"})));
    }

    #[test]
    fn custom_mode() {
        let cmd = set_mode(&Mode::from("mode4"));
        assert_eq!(cmd.properties(), Some(&json!({"active": "mode4"})));
    }

    #[test]
    fn calendar_toggle() {
        assert_eq!(
            shape(&set_calendar(true)),
            (Action::Set, "schedule", true, Some(&json!({"active": true})))
        );
    }

    #[test]
    fn mode_deletion_addresses_the_mode() {
        assert_eq!(
            shape(&delete_mode(&Mode::from("mode3"))),
            (Action::Delete, "modes/mode3", true, None)
        );
    }

    #[test]
    fn privacy_toggle() {
        assert_eq!(
            shape(&set_privacy("CAM1", false)),
            (
                Action::Set,
                "cameras/CAM1",
                true,
                Some(&json!({"privacyActive": false}))
            )
        );
    }
}
