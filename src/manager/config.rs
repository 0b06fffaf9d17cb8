// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timing configuration for subscriptions and correlated calls.

use std::time::Duration;

/// Timeouts used by the subscription engine.
///
/// # Examples
///
/// ```
/// use arlo_lib::manager::SubscriptionConfig;
/// use std::time::Duration;
///
/// let config = SubscriptionConfig::default()
///     .with_connect_timeout(Duration::from_secs(10))
///     .with_response_timeout(Duration::from_secs(30));
///
/// assert_eq!(config.connect_timeout(), Duration::from_secs(10));
/// assert_eq!(config.register_timeout(), SubscriptionConfig::DEFAULT_REGISTER_TIMEOUT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionConfig {
    connect_timeout: Duration,
    register_timeout: Duration,
    response_timeout: Duration,
}

impl SubscriptionConfig {
    /// How long a fresh push channel may take to acknowledge.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
    /// How long the registration handshake may take.
    pub const DEFAULT_REGISTER_TIMEOUT: Duration = Duration::from_secs(120);
    /// Overall deadline for a correlated reply.
    pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

    /// Creates a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            register_timeout: Self::DEFAULT_REGISTER_TIMEOUT,
            response_timeout: Self::DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the registration timeout.
    #[must_use]
    pub const fn with_register_timeout(mut self, timeout: Duration) -> Self {
        self.register_timeout = timeout;
        self
    }

    /// Sets the default deadline for correlated replies.
    #[must_use]
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the registration timeout.
    #[must_use]
    pub const fn register_timeout(&self) -> Duration {
        self.register_timeout
    }

    /// Returns the default deadline for correlated replies.
    #[must_use]
    pub const fn response_timeout(&self) -> Duration {
        self.response_timeout
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self::new()
    }
}
