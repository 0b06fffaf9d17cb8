// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transaction identifier type.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix used by the web client for every transaction id.
pub const TRANS_ID_PREFIX: &str = "web";

/// Process-wide sequence number mixed into every generated id.
static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Label correlating an outbound command with its asynchronous reply.
///
/// Generated ids have the shape `web!<seq>.<random>!<millis>`:
/// a process-wide sequence number keeps ids unique within the process,
/// 64 random bits keep them unique across processes, and the millisecond
/// timestamp makes them readable in logs. The format is otherwise opaque;
/// replies are matched by plain string equality.
///
/// # Examples
///
/// ```
/// use arlo_lib::TransId;
///
/// let a = TransId::generate();
/// let b = TransId::generate();
/// assert_ne!(a, b);
/// assert!(a.as_str().starts_with("web!"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransId(String);

impl TransId {
    /// Generates a fresh transaction id.
    #[must_use]
    pub fn generate() -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let (random, _) = Uuid::new_v4().as_u64_pair();
        let millis = chrono::Utc::now().timestamp_millis();
        Self(format!("{TRANS_ID_PREFIX}!{seq:08x}.{random:016x}!{millis}"))
    }

    /// Wraps an existing transaction id (e.g. one read from an event).
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TransId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransId({})", self.0)
    }
}

impl fmt::Display for TransId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TransId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for TransId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TransId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generate_creates_unique_ids() {
        let ids: HashSet<TransId> = (0..10_000).map(|_| TransId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn generated_id_shape() {
        let id = TransId::generate();
        let parts: Vec<&str> = id.as_str().split('!').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "web");

        let (seq, random) = parts[1].split_once('.').unwrap();
        assert_eq!(seq.len(), 8);
        assert_eq!(random.len(), 16);
        assert!(parts[1].chars().all(|c| c == '.' || c.is_ascii_hexdigit()));

        let millis: i64 = parts[2].parse().unwrap();
        assert!(millis > 1_500_000_000_000);
    }

    #[test]
    fn compares_with_str() {
        let id = TransId::from("web!abc!1");
        assert_eq!(id, "web!abc!1");
        assert_eq!(id.to_string(), "web!abc!1");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = TransId::from("web!abc!1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""web!abc!1""#);
    }

    #[test]
    fn debug_format() {
        let id = TransId::from("web!abc!1");
        assert_eq!(format!("{id:?}"), "TransId(web!abc!1)");
    }
}
