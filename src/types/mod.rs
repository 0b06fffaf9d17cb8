// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! # Types
//!
//! - [`Device`] - An addressable device (base station, camera, ...)
//! - [`TransId`] - Label correlating a command with its asynchronous reply
//! - [`Mode`] - Base station security mode
//! - [`Recording`] - Media library entry

mod device;
mod mode;
mod recording;
mod trans_id;

pub use device::Device;
pub use mode::Mode;
pub use recording::Recording;
#[cfg(feature = "http")]
pub(crate) use recording::RecordingKey;
pub use trans_id::{TRANS_ID_PREFIX, TransId};
